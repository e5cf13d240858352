//! Feed and detail-page parsing
//!
//! The feed parser turns the XML feed into item records. Everything else in
//! this module works on a fetched detail page: flattening it to text,
//! running the ordered pattern chains and scanning tables and JSON-LD.

pub mod attribute_extractor;
pub mod feed_parser;
pub mod page;
pub mod patterns;
pub mod structured_data;
pub mod table_scan;
pub mod vocabulary;

use scraper::Html;

// Re-export public types
pub use crate::infrastructure::parsing_error::{FeedParseError, FeedResult, ProcessingError, ProcessingResult};
pub use attribute_extractor::{AttributeExtractor, ExtractionStep};
pub use feed_parser::{COMMERCE_NAMESPACE, FeedParser};
pub use page::ProductPage;
pub use patterns::{PatternChain, PatternRule, RuleMatch};
pub use structured_data::{LinkedDataLookup, LinkedDataScanner};
pub use table_scan::TableScanner;
pub use vocabulary::Vocabulary;

/// Read-only pass over a parsed document
pub trait DocumentScanner {
    type Output;

    fn scan(&self, document: &Html) -> Self::Output;
}

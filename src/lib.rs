//! Feed Attribute Scraper - enriches shopping-feed items with product
//! attributes recovered from their detail pages
//!
//! The feed is parsed into item records, each detail page is fetched and run
//! through an ordered set of pattern-based extractors, and the results are
//! collected into a tabular supplemental feed.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    BatchOrchestrator, BatchProgress, BatchReport, BatchSettings, ExtractionPipeline, ItemFailure, ItemProcessor,
    ProgressObserver, ValidatedScraperConfig,
};
pub use domain::{AttributeBag, ItemRecord, ResultSet, RunSummary};
pub use infrastructure::{
    AppConfig, AttributeExtractor, FeedParseError, FeedParser, HttpClient, HttpClientConfig, PageFetcher,
    ProcessingError, RequestError,
};

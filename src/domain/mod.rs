//! Domain module - feed items, attribute bags and run results
//!
//! Plain data types shared by the parsing infrastructure and the
//! processing pipeline. Nothing here performs I/O.

pub mod attributes;
pub mod feed_item;
pub mod result_set;

// Re-export commonly used items
pub use attributes::{AttributeBag, keys};
pub use feed_item::ItemRecord;
pub use result_set::{AttributeCoverage, FailedItem, ResultSet, RunSummary};

//! Application layer - item processing and batch orchestration
//!
//! Composes the fetcher and extraction engine into the per-item pipeline
//! and drives it over a whole feed.

pub mod batch_orchestrator;
pub mod events;
pub mod item_processor;
pub mod validated_config;

// Re-export commonly used items
pub use batch_orchestrator::{BatchOrchestrator, BatchReport, BatchSettings, apply_item_cap};
pub use events::{BatchProgress, LoggingProgressObserver, ProgressObserver};
pub use item_processor::{ExtractionPipeline, ItemFailure, ItemProcessor, PageExtractor};
pub use validated_config::ValidatedScraperConfig;

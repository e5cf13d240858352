//! Infrastructure layer: HTTP fetching, feed and page parsing, configuration,
//! logging and export

pub mod config;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, LoggingConfig, ScraperConfig};
pub use export::{ExportError, export_csv, export_json, write_csv};
pub use http_client::{FetchedPage, HttpClient, HttpClientConfig, PageFetcher, RequestError};
pub use logging::init_logging_with_config;
pub use parsing::{AttributeExtractor, ExtractionStep, FeedParser, ProductPage};
pub use parsing_error::{FeedParseError, ProcessingError};

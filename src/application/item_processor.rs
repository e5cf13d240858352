//! One feed item through fetch, parse and extraction
//!
//! Failures never leave this module as errors: they become the bag's error
//! marker. A fetch failure returns the base fields only; an extraction
//! fault keeps whatever was stored before it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{AttributeBag, ItemRecord};
use crate::infrastructure::http_client::{PageFetcher, RequestError};
use crate::infrastructure::parsing::{AttributeExtractor, ExtractionStep, ProductPage};
use crate::infrastructure::parsing_error::{ProcessingError, ProcessingResult};

/// Why an item ended with an error marker. `Display` is the marker text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    #[error("No URL provided")]
    MissingUrl,

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}

/// Fills a bag from a parsed page.
pub trait PageExtractor: Send + Sync {
    fn extract_into(&self, page: &ProductPage, title: &str, bag: &mut AttributeBag);
}

/// The regex steps in order, followed by the table scan.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    extractor: AttributeExtractor,
    steps: Vec<ExtractionStep>,
}

impl ExtractionPipeline {
    pub fn new(include_supplementary: bool) -> ProcessingResult<Self> {
        Ok(Self::with_extractor(AttributeExtractor::new()?, include_supplementary))
    }

    pub fn with_extractor(extractor: AttributeExtractor, include_supplementary: bool) -> Self {
        Self {
            extractor,
            steps: ExtractionStep::sequence(include_supplementary),
        }
    }

    pub fn steps(&self) -> &[ExtractionStep] {
        &self.steps
    }
}

impl PageExtractor for ExtractionPipeline {
    fn extract_into(&self, page: &ProductPage, title: &str, bag: &mut AttributeBag) {
        for step in &self.steps {
            if let Some(value) = self.extractor.run(*step, page, title) {
                bag.insert_extracted(step.key(), value);
            }
        }
        // Table values overwrite regex hits for the keys both produce.
        bag.merge_structured(self.extractor.table_attributes(page));
    }
}

#[derive(Clone)]
pub struct ItemProcessor {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn PageExtractor>,
}

impl ItemProcessor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<dyn PageExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Produce the bag for one record. Never fails.
    pub async fn process(&self, record: &ItemRecord) -> AttributeBag {
        let mut bag = AttributeBag::from_record(record);

        if record.url.is_empty() {
            warn!("Item {} has no URL", record.label());
            bag.mark_failed(ItemFailure::MissingUrl);
            return bag;
        }

        let page = match self.fetcher.fetch(&record.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetch failed for {}: {}", record.url, e);
                bag.mark_failed(ItemFailure::from(e));
                return bag;
            }
        };
        debug!("Fetched {} ({} bytes)", page.url, page.body.len());

        if let Err(e) = self.extract(&page.body, record.title_or_empty(), &mut bag) {
            warn!("Extraction failed for {}: {}", record.url, e);
            bag.mark_failed(ItemFailure::from(e));
        }

        info!(
            "Item {}: {} attribute(s) extracted",
            record.label(),
            bag.extracted_count()
        );
        bag
    }

    /// Parse `html` and run the extractor, converting a panic into an error.
    /// Values stored before the panic stay on the bag.
    pub fn extract(&self, html: &str, title: &str, bag: &mut AttributeBag) -> ProcessingResult<()> {
        let extractor = &self.extractor;
        panic::catch_unwind(AssertUnwindSafe(|| {
            let page = ProductPage::parse(html);
            extractor.extract_into(&page, title, bag);
        }))
        .map_err(|payload| ProcessingError::Panicked(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;
    use crate::infrastructure::http_client::FetchedPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, RequestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage {
                url: url.to_string(),
                status: 200,
                body: self.body.to_string(),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, RequestError> {
            Err(RequestError::Timeout {
                url: url.to_string(),
                timeout_seconds: 15,
            })
        }
    }

    /// Stores one value, then panics.
    struct PanickingExtractor;

    impl PageExtractor for PanickingExtractor {
        fn extract_into(&self, _page: &ProductPage, _title: &str, bag: &mut AttributeBag) {
            bag.insert_extracted(keys::WEIGHT, "2 kg");
            panic!("selector blew up");
        }
    }

    fn pipeline(include_supplementary: bool) -> Arc<dyn PageExtractor> {
        Arc::new(ExtractionPipeline::new(include_supplementary).unwrap())
    }

    fn record(url: &str) -> ItemRecord {
        ItemRecord::new(Some("A1".into()), Some("Blue Cotton Scarf M".into()), url)
    }

    #[test]
    fn marker_text_matches_failure_kind() {
        assert_eq!(ItemFailure::MissingUrl.to_string(), "No URL provided");
        let request = ItemFailure::from(RequestError::Status {
            status: 500,
            url: "http://x".into(),
        });
        assert_eq!(request.to_string(), "Request error: HTTP 500 for url (http://x)");
        let processing = ItemFailure::from(ProcessingError::Panicked("boom".into()));
        assert_eq!(processing.to_string(), "Processing error: extractor panicked: boom");
    }

    #[tokio::test]
    async fn empty_url_skips_the_fetch() {
        let fetcher = Arc::new(StaticFetcher::new("<p>Colour: Red</p>"));
        let processor = ItemProcessor::new(fetcher.clone(), pipeline(false));

        let bag = processor.process(&record("")).await;
        assert_eq!(bag.error(), Some("No URL provided"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_only_base_fields() {
        let processor = ItemProcessor::new(Arc::new(FailingFetcher), pipeline(false));

        let bag = processor.process(&record("http://example.com/slow")).await;
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["id", "title", "url"]);
        assert!(bag.error().unwrap().starts_with("Request error: "));
    }

    #[tokio::test]
    async fn extraction_panic_keeps_partial_results() {
        let processor = ItemProcessor::new(Arc::new(StaticFetcher::new("<p>x</p>")), Arc::new(PanickingExtractor));

        let bag = processor.process(&record("http://example.com/p1")).await;
        assert_eq!(bag.get(keys::WEIGHT), Some("2 kg"));
        assert_eq!(
            bag.error(),
            Some("Processing error: extractor panicked: selector blew up")
        );
    }

    #[tokio::test]
    async fn table_values_overwrite_regex_values() {
        let fetcher = Arc::new(StaticFetcher::new(
            "<p>Weight: 2 kg</p><table><tr><td>Weight</td><td>2.4 kg</td></tr>\
             <tr><td>Colour</td><td>Navy</td></tr></table>",
        ));
        let processor = ItemProcessor::new(fetcher, pipeline(false));

        let bag = processor.process(&record("http://example.com/p1")).await;
        assert_eq!(bag.get(keys::WEIGHT), Some("2.4 kg"));
        assert_eq!(bag.get(keys::TABLE_COLOUR), Some("Navy"));
        // The regex extractor still found a colour via the title.
        assert_eq!(bag.get(keys::COLOR), Some("Blue"));
        assert!(!bag.is_failed());
    }

    #[tokio::test]
    async fn supplementary_steps_only_when_enabled() {
        let body = "<p>Brand: Acme. 2 year warranty</p>";

        let standard = ItemProcessor::new(Arc::new(StaticFetcher::new(body)), pipeline(false));
        let bag = standard.process(&record("http://example.com/p1")).await;
        assert!(!bag.contains(keys::BRAND));

        let extended = ItemProcessor::new(Arc::new(StaticFetcher::new(body)), pipeline(true));
        let bag = extended.process(&record("http://example.com/p1")).await;
        assert_eq!(bag.get(keys::BRAND), Some("Acme"));
        assert_eq!(bag.get(keys::WARRANTY), Some("2 year warranty"));
    }

    #[test]
    fn pipeline_steps_follow_the_standard_order() {
        let pipeline = ExtractionPipeline::new(false).unwrap();
        let keys: Vec<&str> = pipeline.steps().iter().map(|step| step.key()).collect();
        assert_eq!(keys, vec!["size_dimensions", "weight", "color", "material", "pattern", "size"]);
        assert_eq!(ExtractionPipeline::new(true).unwrap().steps().last(), Some(&ExtractionStep::Brand));
    }
}

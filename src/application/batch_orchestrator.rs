//! Sequential batch driver
//!
//! Items are processed one at a time in feed order with a fixed pause
//! between consecutive requests. Cancellation is checked before each item
//! and during the pause; a fetch already in flight is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::events::{BatchProgress, ProgressObserver};
use super::item_processor::ItemProcessor;
use super::validated_config::ValidatedScraperConfig;
use crate::domain::{ItemRecord, ResultSet, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Pause between consecutive items; none after the last
    pub delay: Duration,
    /// Process only the first N items; 0 means all
    pub max_items: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from(&ValidatedScraperConfig::default())
    }
}

impl From<&ValidatedScraperConfig> for BatchSettings {
    fn from(config: &ValidatedScraperConfig) -> Self {
        Self {
            delay: config.request_delay,
            max_items: config.max_items,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Items scheduled after the cap was applied
    pub requested: usize,
    pub cancelled: bool,
    pub results: ResultSet,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn summary(&self) -> RunSummary {
        self.results.summary()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Truncate to the first `max_items` items when the cap is non-zero.
pub fn apply_item_cap(mut items: Vec<ItemRecord>, max_items: usize) -> Vec<ItemRecord> {
    if max_items > 0 {
        items.truncate(max_items);
    }
    items
}

pub struct BatchOrchestrator {
    processor: ItemProcessor,
    settings: BatchSettings,
    observers: Vec<Arc<dyn ProgressObserver>>,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    pub fn new(processor: ItemProcessor, settings: BatchSettings) -> Self {
        Self {
            processor,
            settings,
            observers: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process `items` and collect one bag per item started.
    pub async fn run(&self, items: Vec<ItemRecord>) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let items = apply_item_cap(items, self.settings.max_items);
        let total = items.len();

        info!(
            "Batch {} started: {} item(s), {:?} between requests",
            run_id, total, self.settings.delay
        );

        let mut results = ResultSet::with_capacity(total);
        let mut cancelled = false;

        for (index, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Batch {} cancelled before item {}/{}", run_id, index + 1, total);
                cancelled = true;
                break;
            }

            info!("[{}/{}] Processing {}", index + 1, total, item);
            let bag = self.processor.process(item).await;
            let progress = BatchProgress {
                completed: index + 1,
                total,
                item_label: item.label().to_string(),
                url: item.url.clone(),
                error: bag.error().map(str::to_string),
            };
            results.push(bag);
            self.notify(&progress);

            let is_last = index + 1 == total;
            if !is_last && !self.settings.delay.is_zero() {
                tokio::select! {
                    () = self.cancel.cancelled() => {
                        warn!("Batch {} cancelled after {}/{} item(s)", run_id, index + 1, total);
                        cancelled = true;
                        break;
                    }
                    () = tokio::time::sleep(self.settings.delay) => {}
                }
            }
        }

        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            requested: total,
            cancelled,
            results,
        };
        let summary = report.summary();
        info!(
            "Batch {} finished: {} processed, {} succeeded, {} failed",
            run_id, summary.total, summary.succeeded, summary.failed
        );
        report
    }

    fn notify(&self, progress: &BatchProgress) {
        for observer in &self.observers {
            observer.on_progress(progress);
        }
    }
}

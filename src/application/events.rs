//! Progress reporting for a running batch
//!
//! The orchestrator notifies every registered observer after each item.
//! Observers run inline on the batch task and should return quickly.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Snapshot sent after an item finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    /// Feed id of the item, or a placeholder when it had none
    pub item_label: String,
    pub url: String,
    /// The item's error marker, if it failed
    pub error: Option<String>,
}

impl BatchProgress {
    /// Completed share in `0.0..=1.0`; an empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.completed as f64 / self.total as f64;
        fraction.min(1.0)
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &BatchProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &BatchProgress) {
        self(progress);
    }
}

/// Writes one log line per finished item.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressObserver;

impl ProgressObserver for LoggingProgressObserver {
    fn on_progress(&self, progress: &BatchProgress) {
        let percent = progress.fraction() * 100.0;
        match &progress.error {
            None => info!(
                "Processed {}/{} ({:.0}%): {}",
                progress.completed, progress.total, percent, progress.item_label
            ),
            Some(error) => warn!(
                "Processed {}/{} ({:.0}%): {} failed: {}",
                progress.completed, progress.total, percent, progress.item_label, error
            ),
        }
    }
}

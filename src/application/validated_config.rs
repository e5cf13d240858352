use std::time::Duration;

use tracing::{info, warn};

use crate::infrastructure::config::{ScraperConfig, defaults};

/// Scraper settings checked against their allowed ranges.
///
/// Out-of-range values are clamped (with a warning), never rejected. The
/// delay is additionally snapped to the nearest half second.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScraperConfig {
    pub request_delay: Duration,
    pub max_items: usize,
    pub include_supplementary_attributes: bool,
}

impl ValidatedScraperConfig {
    pub fn from_scraper_config(config: &ScraperConfig) -> Self {
        Self {
            request_delay: Duration::from_secs_f64(Self::validate_delay(config.request_delay_seconds)),
            max_items: Self::validate_max_items(config.max_items),
            include_supplementary_attributes: config.include_supplementary_attributes,
        }
    }

    fn validate_delay(requested: f64) -> f64 {
        if !requested.is_finite() {
            warn!(
                "Request delay {} is not a number, using default {}s",
                requested,
                defaults::REQUEST_DELAY_SECONDS
            );
            return defaults::REQUEST_DELAY_SECONDS;
        }

        let clamped = requested.clamp(
            defaults::MIN_REQUEST_DELAY_SECONDS,
            defaults::MAX_REQUEST_DELAY_SECONDS,
        );
        let snapped = (clamped / defaults::REQUEST_DELAY_STEP_SECONDS).round() * defaults::REQUEST_DELAY_STEP_SECONDS;
        if (snapped - requested).abs() > f64::EPSILON {
            warn!("Request delay {}s adjusted to {}s", requested, snapped);
        }
        snapped
    }

    fn validate_max_items(requested: usize) -> usize {
        if requested > defaults::MAX_ITEMS_LIMIT {
            warn!(
                "Item cap {} exceeds the limit, using {}",
                requested,
                defaults::MAX_ITEMS_LIMIT
            );
            return defaults::MAX_ITEMS_LIMIT;
        }
        requested
    }

    pub fn log_config(&self) {
        info!("Scraper settings applied:");
        info!("   request_delay: {:?}", self.request_delay);
        if self.max_items == 0 {
            info!("   max_items: unlimited");
        } else {
            info!("   max_items: {}", self.max_items);
        }
        info!(
            "   supplementary attributes: {}",
            self.include_supplementary_attributes
        );
    }
}

impl Default for ValidatedScraperConfig {
    fn default() -> Self {
        Self::from_scraper_config(&ScraperConfig::default())
    }
}

//! Configuration infrastructure
//!
//! Settings live in a single JSON file under the user configuration
//! directory (or at an explicit path). Missing sections and fields fall back
//! to defaults, so older files keep loading as new settings are added.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::http_client::HttpClientConfig;

const APP_DIR_NAME: &str = "feed-attribute-scraper";
const CONFIG_FILE_NAME: &str = "scraper_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Batch behaviour
    pub scraper: ScraperConfig,

    /// Client identity and timeout for detail-page requests
    pub http: HttpClientConfig,

    pub logging: LoggingConfig,
}

/// Batch settings as written in the file; see `ValidatedScraperConfig` for
/// the bounded values actually used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Pause between consecutive item requests
    pub request_delay_seconds: f64,

    /// Only the first N feed items are processed; 0 means all
    pub max_items: usize,

    /// Also run the gsm, gtin, motor, warranty and brand extractors
    pub include_supplementary_attributes: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_delay_seconds: defaults::REQUEST_DELAY_SECONDS,
            max_items: defaults::MAX_ITEMS,
            include_supplementary_attributes: false,
        }
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Directory for log files; defaults to the app data directory
    pub log_directory: Option<PathBuf>,

    /// Number of log files to keep
    pub max_files: u32,

    /// Per-target level overrides (e.g. "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_directory: None,
            max_files: defaults::LOG_MAX_FILES,
            module_filters: HashMap::new(),
        }
    }
}

/// Configuration manager for loading and saving settings
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);
        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(APP_DIR_NAME);
        Ok(data_dir)
    }

    /// Manager for the default file in the user configuration directory
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Manager for an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// An unreadable file is backed up next to the original and replaced by
    /// defaults rather than failing the run.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("Configuration file could not be parsed: {}", parse_error);

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                info!("Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Update scraper settings in place
    pub async fn update_scraper_config<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut ScraperConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.scraper);
        self.save_config(&config).await
    }
}

/// Default configuration values
pub mod defaults {
    /// Default delay between requests in seconds
    pub const REQUEST_DELAY_SECONDS: f64 = 1.0;

    /// Lower bound for the request delay
    pub const MIN_REQUEST_DELAY_SECONDS: f64 = 0.5;

    /// Upper bound for the request delay
    pub const MAX_REQUEST_DELAY_SECONDS: f64 = 5.0;

    /// Granularity of the request delay
    pub const REQUEST_DELAY_STEP_SECONDS: f64 = 0.5;

    /// Default item cap (0 = unlimited)
    pub const MAX_ITEMS: usize = 0;

    /// Largest accepted item cap
    pub const MAX_ITEMS_LIMIT: usize = 1000;

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_MAX_FILES: u32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert!((config.scraper.request_delay_seconds - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.scraper.max_items, 0);
        assert!(!config.scraper.include_supplementary_attributes);
        assert_eq!(config.http.timeout_seconds, 15);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"scraper":{"max_items":25}}"#).unwrap();
        assert_eq!(config.scraper.max_items, 25);
        assert!((config.scraper.request_delay_seconds - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.http, HttpClientConfig::default());
    }

    #[tokio::test]
    async fn first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn saved_changes_are_loaded_back() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        manager
            .update_scraper_config(|scraper| {
                scraper.max_items = 40;
                scraper.include_supplementary_attributes = true;
            })
            .await
            .unwrap();

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.scraper.max_items, 40);
        assert!(config.scraper.include_supplementary_attributes);
    }

    #[tokio::test]
    async fn corrupted_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let manager = ConfigManager::with_path(&path);
        let config = manager.load_config().await.unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.with_extension("json.corrupted").exists());
    }
}

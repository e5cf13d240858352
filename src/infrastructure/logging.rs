//! Logging system configuration and initialization
//!
//! - Console output on stderr, optional file output through a non-blocking
//!   appender
//! - Optional structured JSON lines
//! - `RUST_LOG` overrides the configured level entirely
//! - Dependency noise (HTTP client, HTML parser) is capped unless the level
//!   is `trace`

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, MakeWriter, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

const LOG_FILE_PREFIX: &str = "feed-attribute-scraper";

/// Targets capped at `warn` unless tracing everything.
const NOISY_TARGETS: [&str; 5] = ["reqwest", "hyper", "hyper_util", "html5ever", "selectors"];

// Keeps the file writer alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Millisecond UTC timestamps
struct UtcTimeFormatter;

impl FormatTime for UtcTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

/// Directory for log files: the configured one, else `<app data>/logs`,
/// else `./logs`.
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.log_directory {
        return dir.clone();
    }
    ConfigManager::get_app_data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

/// Build the level filter for a configuration.
///
/// `RUST_LOG`, when set and valid, replaces everything else.
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for_level(config))
}

fn filter_for_level(config: &LoggingConfig) -> EnvFilter {
    let mut directives = vec![config.level.clone()];
    if !config.level.to_lowercase().contains("trace") {
        directives.extend(NOISY_TARGETS.iter().map(|target| format!("{target}=warn")));
    }
    let mut module_filters: Vec<_> = config.module_filters.iter().collect();
    module_filters.sort();
    directives.extend(module_filters.into_iter().map(|(target, level)| format!("{target}={level}")));

    let joined = directives.join(",");
    EnvFilter::try_new(&joined).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{joined}': {e}; falling back to info");
        EnvFilter::new("info")
    })
}

/// Console subscriber for the start-up phase, before the configuration that
/// drives [`init_logging_with_config`] has been loaded.
///
/// Install it with `tracing::subscriber::set_default` and drop the guard
/// before initializing the real subscriber.
pub fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::Subscriber::builder()
        .with_writer(writer)
        .with_env_filter(build_env_filter(&LoggingConfig::default()))
        .with_timer(UtcTimeFormatter)
        .with_target(false)
        .finish()
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let registry = Registry::default().with(build_env_filter(config));

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(UtcTimeFormatter)
            .with_target(false)
    });

    let mut log_dir = None;
    let (file_layer, json_file_layer) = if config.file_output {
        let dir = get_log_directory(config);
        std::fs::create_dir_all(&dir).map_err(|e| anyhow!("Failed to create log directory {:?}: {}", dir, e))?;
        cleanup_old_logs(&dir, config.max_files);

        let file_name = format!("{LOG_FILE_PREFIX}-{}.log", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
        let (file_writer, file_guard) = non_blocking(rolling::never(&dir, file_name));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);
        log_dir = Some(dir);

        if config.json_format {
            let layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(UtcTimeFormatter)
                .with_target(true)
                .with_ansi(false);
            (None, Some(layer))
        } else {
            let layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(UtcTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            (Some(layer), None)
        }
    } else {
        (None, None)
    };

    if console_layer.is_none() && log_dir.is_none() {
        return Err(anyhow!("No logging output configured"));
    }

    registry
        .with(console_layer)
        .with(file_layer)
        .with(json_file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging initialized (level {}, json {})", config.level, config.json_format);
    if let Some(dir) = log_dir {
        info!("Log directory: {:?}", dir);
    }
    Ok(())
}

/// Keep the newest `max_files - 1` logs so the new file brings the count to
/// `max_files`.
fn cleanup_old_logs(log_dir: &Path, max_files: u32) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log"))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((entry.path(), modified))
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = (max_files as usize).saturating_sub(1);
    for (path, _) in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        }
    }
}

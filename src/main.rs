use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use feed_attribute_scraper::application::{
    BatchOrchestrator, BatchReport, BatchSettings, ExtractionPipeline, ItemProcessor, LoggingProgressObserver,
    ValidatedScraperConfig,
};
use feed_attribute_scraper::infrastructure::{
    AppConfig, ConfigManager, FeedParser, HttpClient, export_csv, export_json, init_logging_with_config,
};
use feed_attribute_scraper::infrastructure::logging::bootstrap_subscriber;

/// Enrich a shopping feed with attributes scraped from each item's page
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// XML product feed to read
    feed: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between requests (0.5 - 5.0, step 0.5)
    #[arg(long)]
    delay: Option<f64>,

    /// Process only the first N items (0 = all, at most 1000)
    #[arg(long)]
    max_items: Option<usize>,

    /// CSV output path
    #[arg(long, default_value = "supplemental_feed.csv")]
    output: PathBuf,

    /// Also write the results as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Extract gsm, gtin, motor, warranty and brand too
    #[arg(long, default_value_t = false)]
    supplementary: bool,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(delay) = self.delay {
            config.scraper.request_delay_seconds = delay;
        }
        if let Some(max_items) = self.max_items {
            config.scraper.max_items = max_items;
        }
        if self.supplementary {
            config.scraper.include_supplementary_attributes = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loading logs to stderr until the configured subscriber is up
    let mut config = {
        let _bootstrap = tracing::subscriber::set_default(bootstrap_subscriber(std::io::stderr));
        let manager = match &args.config {
            Some(path) => ConfigManager::with_path(path),
            None => ConfigManager::new()?,
        };
        manager.load_config().await?
    };
    args.apply_overrides(&mut config);

    init_logging_with_config(&config.logging)?;

    let scraper = ValidatedScraperConfig::from_scraper_config(&config.scraper);
    scraper.log_config();

    let feed = tokio::fs::read(&args.feed)
        .await
        .with_context(|| format!("Failed to read feed {}", args.feed.display()))?;
    let items = FeedParser::new().parse(&feed).map_err(|e| {
        error!("Feed {} could not be parsed: {}", args.feed.display(), e);
        e
    })?;
    info!("Feed {} lists {} item(s) with a URL", args.feed.display(), items.len());

    let fetcher = Arc::new(HttpClient::new(config.http.clone())?);
    let pipeline = ExtractionPipeline::new(scraper.include_supplementary_attributes)?;
    let steps: Vec<&str> = pipeline.steps().iter().map(|step| step.key()).collect();
    info!("Extraction steps: {}", steps.join(", "));
    let pipeline = Arc::new(pipeline);
    let processor = ItemProcessor::new(fetcher, pipeline);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            ctrl_c.cancel();
        }
    });

    let orchestrator = BatchOrchestrator::new(processor, BatchSettings::from(&scraper))
        .with_observer(Arc::new(LoggingProgressObserver))
        .with_cancellation(cancel);
    let report = orchestrator.run(items).await;

    export_csv(&report.results, &args.output)?;
    if let Some(path) = &args.json {
        export_json(&report.results, path)?;
    }

    print_summary(&report, &args);
    Ok(())
}

fn print_summary(report: &BatchReport, args: &Args) {
    let summary = report.summary();
    println!("Run {}", report.run_id);
    println!(
        "Processed {}/{} item(s) in {}s{}",
        report.processed(),
        report.requested,
        report.elapsed().num_seconds(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    println!(
        "Succeeded: {}  Failed: {}  Success rate: {:.1}%",
        summary.succeeded,
        summary.failed,
        summary.success_rate()
    );

    let coverage = report.results.coverage();
    if !coverage.is_empty() {
        println!("Attribute coverage:");
        for entry in coverage {
            println!("  {:<16} {:>5} ({:.1}%)", entry.attribute, entry.found, entry.percentage);
        }
    }

    let failures: Vec<_> = report.results.failures().collect();
    if !failures.is_empty() {
        println!("Failed items:");
        for failure in failures {
            println!("  {} - {}", failure.url, failure.error);
        }
    }

    println!("CSV written to {}", args.output.display());
    if let Some(path) = &args.json {
        println!("JSON written to {}", path.display());
    }
}

//! Sina-Tick-Crawler main entry point
//!
//! This is the command-line front end: it validates the request, runs the
//! crawl on a worker task while streaming progress, then exports and
//! summarises what was collected.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sina_tick_crawler::config::{load_config_with_hash, Config};
use sina_tick_crawler::crawler::{CrawlReport, CrawlStatus};
use sina_tick_crawler::output::{export_to_directory, print_summary, OutputError, PriceSummary};
use sina_tick_crawler::{CrawlRequest, Crawler};
use tracing_subscriber::EnvFilter;

/// Sina-Tick-Crawler: intraday trade history harvester
///
/// Walks every calendar day between --start and --end, pages through the
/// trade-history tables for TICKER, and exports the trades as CSV.
#[derive(Parser, Debug)]
#[command(name = "sina-tick-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Intraday trade history harvester", long_about = None)]
struct Cli {
    /// Ticker symbol with exchange prefix, e.g. sz000001
    #[arg(value_name = "TICKER")]
    ticker: String,

    /// First date to crawl (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start: String,

    /// Last date to crawl, inclusive (YYYY-MM-DD); defaults to --start
    #[arg(long, value_name = "DATE")]
    end: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to export the CSV into (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Skip writing the CSV export
    #[arg(long)]
    no_export: bool,

    /// Print trade price statistics after the crawl
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress lines and non-error logs
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    // Rejected here, before any request is made
    let end = cli.end.as_deref().unwrap_or(cli.start.as_str());
    let request =
        CrawlRequest::parse(&cli.ticker, &cli.start, end).context("Invalid crawl request")?;

    let report = run_crawl(&config, request.clone(), cli.quiet).await?;
    print_report(&report);

    if !cli.no_export {
        let directory = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.directory));
        match export_to_directory(&report.records, &request, &directory) {
            Ok(path) => println!("✓ Exported to: {}", path.display()),
            Err(OutputError::NoRecords) => println!("No records collected; nothing exported"),
            Err(e) => return Err(e).context("Export failed"),
        }
    }

    if cli.stats {
        match PriceSummary::from_records(&report.records) {
            Some(summary) => print_summary(&summary),
            None => println!("No trades to summarise"),
        }
    }

    if let CrawlStatus::Failed { date, page, error } = &report.status {
        bail!("Crawl incomplete: failed at {} page {}: {}", date, page, error);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sina_tick_crawler=info,warn"),
            1 => EnvFilter::new("sina_tick_crawler=debug,info"),
            2 => EnvFilter::new("sina_tick_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the crawl on its worker, streaming progress until it stops
///
/// Ctrl-C cancels the crawl; whatever was collected so far is still returned.
async fn run_crawl(
    config: &Config,
    request: CrawlRequest,
    quiet: bool,
) -> anyhow::Result<CrawlReport> {
    tracing::info!(
        "Crawling {} from {} to {}",
        request.ticker(),
        request.start(),
        request.end()
    );

    let crawler = Crawler::from_config(config).context("Failed to build HTTP client")?;
    let mut handle = crawler.spawn(request);

    let token = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            token.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        if !quiet {
            println!("{}", event);
        }
    }

    Ok(handle.wait().await?)
}

/// Prints the outcome of a crawl run
fn print_report(report: &CrawlReport) {
    println!();
    match &report.status {
        CrawlStatus::Completed => println!("Crawl completed"),
        CrawlStatus::Cancelled { date, page } => {
            println!("Crawl cancelled before {} page {}", date, page)
        }
        CrawlStatus::Failed { date, page, .. } => {
            println!("Crawl stopped at {} page {}", date, page)
        }
    }
    println!("  Records collected: {}", report.records.len());
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Rows skipped: {}", report.rows_skipped);
    if !report.truncated_dates.is_empty() {
        let dates: Vec<String> = report
            .truncated_dates
            .iter()
            .map(|d| d.to_string())
            .collect();
        println!("  Truncated dates: {}", dates.join(", "));
    }
}

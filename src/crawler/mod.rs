//! Crawler module for trade-history pages
//!
//! This module contains the core crawling logic, including:
//! - Crawl request validation
//! - HTTP fetching and charset detection
//! - HTML table parsing and row-to-record mapping
//! - Date iteration, pacing, retries and cancellation
//! - Overall crawl coordination on a dedicated worker task

mod coordinator;
mod encoding;
mod fetcher;
mod parser;
mod request;
mod scheduler;

pub use coordinator::{CrawlHandle, CrawlReport, CrawlStatus, Crawler};
pub use encoding::{charset_from_content_type, decode_body, detect_encoding};
pub use fetcher::{build_http_client, build_page_url, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::{parse_record, parse_rows, TableRow};
pub use request::{parse_date, CrawlRequest};
pub use scheduler::{CancelToken, DateRange, Scheduler};

use crate::config::Config;
use crate::state::TracingSink;
use crate::CrawlerError;

/// Runs a complete crawl with the real HTTP fetcher on the current task
///
/// This is the simplest entry point when no live progress view is needed:
/// progress events go to the log, and the call returns once the crawl has
/// stopped. Use [`Crawler::spawn`] to run on a dedicated worker instead.
///
/// # Example
///
/// ```no_run
/// use sina_tick_crawler::config::Config;
/// use sina_tick_crawler::crawler::{crawl, CrawlRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27")?;
/// let report = crawl(&Config::default(), &request).await?;
/// println!("{} trades", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config, request: &CrawlRequest) -> Result<CrawlReport, CrawlerError> {
    let crawler = Crawler::from_config(config)?;
    Ok(crawler
        .run(request, &TracingSink, &CancelToken::new())
        .await)
}

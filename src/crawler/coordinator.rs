//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that walks a request's schedule:
//! - One date at a time, ascending
//! - One page at a time from page 1 until the source runs dry
//! - One row at a time into the run's record store
//!
//! It also owns the worker spawn: a crawl runs on its own tokio task and hands
//! its record store back only once it has stopped.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_page_url, FetchedPage, HttpFetcher, PageFetcher};
use crate::crawler::parser::parse_record;
use crate::crawler::request::CrawlRequest;
use crate::crawler::scheduler::{CancelToken, DateRange, Scheduler};
use crate::state::{ChannelSink, PageCursor, ProgressEvent, ProgressSink, RecordStore};
use crate::{ConfigError, CrawlerError, FetchError};
use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use url::Url;

/// How a crawl run ended
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlStatus {
    /// Every date in the range was walked to exhaustion
    Completed,

    /// Stopped on request before fetching `page` of `date`
    Cancelled { date: NaiveDate, page: u32 },

    /// Stopped on a transport failure that survived all retries
    Failed {
        date: NaiveDate,
        page: u32,
        error: FetchError,
    },
}

/// Everything a run produced, handed back once the run has stopped
///
/// Records collected before a cancellation or failure are kept.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Trade records in discovery order
    pub records: RecordStore,

    /// Terminal state of the run
    pub status: CrawlStatus,

    /// Pages fetched successfully, empty pages included
    pub pages_fetched: u64,

    /// Data rows dropped because they could not be parsed
    pub rows_skipped: u64,

    /// Dates abandoned after hitting the per-date page bound
    pub truncated_dates: Vec<NaiveDate>,
}

impl CrawlReport {
    fn new() -> Self {
        Self {
            records: RecordStore::new(),
            status: CrawlStatus::Completed,
            pages_fetched: 0,
            rows_skipped: 0,
            truncated_dates: Vec::new(),
        }
    }

    /// Returns true if the whole schedule was walked
    pub fn is_complete(&self) -> bool {
        matches!(self.status, CrawlStatus::Completed)
    }
}

/// Why a fetch did not produce a page
enum Interruption {
    Cancelled,
    Failed(FetchError),
}

/// Main crawler structure
pub struct Crawler<F> {
    fetcher: F,
    config: CrawlerConfig,
    base_url: Url,
}

impl Crawler<HttpFetcher> {
    /// Creates a crawler backed by a real HTTP client
    pub fn from_config(config: &Config) -> Result<Self, CrawlerError> {
        let fetcher = HttpFetcher::from_config(&config.crawler, &config.source)?;
        Self::new(fetcher, config)
    }
}

impl<F: PageFetcher> Crawler<F> {
    /// Creates a crawler around any page fetcher
    pub fn new(fetcher: F, config: &Config) -> Result<Self, CrawlerError> {
        let base_url = Url::parse(&config.source.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        Ok(Self {
            fetcher,
            config: config.crawler.clone(),
            base_url,
        })
    }

    /// Runs one crawl to completion, cancellation, or fatal failure
    ///
    /// # Flow
    ///
    /// For each date in the request, for page = 1, 2, ...:
    /// 1. Check the cancel token, emit a page event
    /// 2. Wait for the pacing interval, check the cancel token again
    /// 3. Fetch (retrying transient failures), decode, split into rows
    /// 4. If the page has at most the label row, move to the next date
    /// 5. Otherwise parse each data row; malformed rows are skipped
    ///
    /// Exactly one terminal event (`Finished`, `Failed` or `Cancelled`) is
    /// emitted before returning.
    pub async fn run(
        &self,
        request: &CrawlRequest,
        sink: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> CrawlReport {
        let mut scheduler = Scheduler::new(&self.config);
        let mut report = CrawlReport::new();

        tracing::info!(
            "Starting crawl of {} from {} to {} ({} days)",
            request.ticker(),
            request.start(),
            request.end(),
            request.days()
        );

        for date in DateRange::new(request.start(), request.end()) {
            let records_before = report.records.len();
            let mut page = 1;

            loop {
                if !scheduler.page_allowed(page) {
                    tracing::warn!(
                        "Reached {} pages for {} on {}; moving to next date",
                        self.config.max_pages_per_date,
                        request.ticker(),
                        date
                    );
                    report.truncated_dates.push(date);
                    break;
                }

                if cancel.is_cancelled() {
                    return cancelled(report, sink, date, page);
                }

                sink.emit(ProgressEvent::page(request.ticker(), date, page));
                scheduler.wait_turn().await;

                if cancel.is_cancelled() {
                    return cancelled(report, sink, date, page);
                }

                let url = build_page_url(&self.base_url, request.ticker(), date, page);
                let fetched = match self.fetch_with_retry(&url, &mut scheduler, cancel).await {
                    Ok(fetched) => fetched,
                    Err(Interruption::Cancelled) => return cancelled(report, sink, date, page),
                    Err(Interruption::Failed(error)) => {
                        tracing::error!("Crawl aborted at {} page {}: {}", date, page, error);
                        sink.emit(ProgressEvent::Failed {
                            date,
                            page,
                            message: error.to_string(),
                        });
                        report.status = CrawlStatus::Failed { date, page, error };
                        return report;
                    }
                };
                report.pages_fetched += 1;

                let cursor = PageCursor::from_body(date, page, fetched.text());
                if cursor.is_exhausted() {
                    tracing::debug!(
                        "{} page {} has {} rows; date exhausted",
                        date,
                        page,
                        cursor.row_count()
                    );
                    break;
                }

                self.collect_rows(&cursor, &mut report);
                page += 1;
            }

            tracing::info!(
                "Finished {}: {} records",
                date,
                report.records.len() - records_before
            );
        }

        tracing::info!(
            "Crawl completed: {} records from {} pages, {} rows skipped",
            report.records.len(),
            report.pages_fetched,
            report.rows_skipped
        );
        sink.emit(ProgressEvent::Finished);
        report
    }

    /// Parses every data row of a page into the report's store
    fn collect_rows(&self, cursor: &PageCursor, report: &mut CrawlReport) {
        for (index, row) in cursor.data_rows().iter().enumerate() {
            match parse_record(row) {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    // +1 for the label row
                    tracing::warn!(
                        "Skipping row {} of {} page {}: {}",
                        index + 1,
                        cursor.date,
                        cursor.page,
                        e
                    );
                    report.rows_skipped += 1;
                }
            }
        }
    }

    /// Fetches a page, retrying transient failures with linear backoff
    ///
    /// Retries are paced like first attempts.
    async fn fetch_with_retry(
        &self,
        url: &Url,
        scheduler: &mut Scheduler,
        cancel: &CancelToken,
    ) -> Result<FetchedPage, Interruption> {
        let mut attempt = 0;

        loop {
            match self.fetcher.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    let Some(delay) = scheduler.retry_backoff(attempt) else {
                        return Err(Interruption::Failed(e));
                    };

                    tracing::warn!("{} (retry {} in {:?})", e, attempt, delay);
                    scheduler.wait_retry(delay).await;

                    if cancel.is_cancelled() {
                        return Err(Interruption::Cancelled);
                    }
                }
                Err(e) => return Err(Interruption::Failed(e)),
            }
        }
    }
}

impl<F: PageFetcher + 'static> Crawler<F> {
    /// Starts the crawl on a dedicated tokio task
    ///
    /// Progress events stream through the returned handle; the record store
    /// comes back only from [`CrawlHandle::wait`].
    pub fn spawn(self, request: CrawlRequest) -> CrawlHandle {
        let (sender, events) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let sink = ChannelSink::new(sender);
            self.run(&request, &sink, &token).await
        });

        CrawlHandle {
            join,
            cancel,
            events,
        }
    }
}

/// Emits the cancellation event and closes the report
fn cancelled(
    mut report: CrawlReport,
    sink: &dyn ProgressSink,
    date: NaiveDate,
    page: u32,
) -> CrawlReport {
    tracing::info!("Crawl cancelled before {} page {}", date, page);
    sink.emit(ProgressEvent::Cancelled);
    report.status = CrawlStatus::Cancelled { date, page };
    report
}

/// Handle to a crawl running on its own task
pub struct CrawlHandle {
    join: JoinHandle<CrawlReport>,
    cancel: CancelToken,
    events: UnboundedReceiver<ProgressEvent>,
}

impl CrawlHandle {
    /// Asks the crawl to stop before its next page
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Another handle to the crawl's cancellation flag
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next progress event; `None` once the crawl has stopped and all events are drained
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Waits for the crawl to stop and takes its report
    pub async fn wait(self) -> Result<CrawlReport, CrawlerError> {
        self.join
            .await
            .map_err(|e| CrawlerError::Worker(e.to_string()))
    }
}

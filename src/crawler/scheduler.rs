//! Scheduler for walking the crawl schedule politely
//!
//! This module handles:
//! - Enumerating every calendar day of an inclusive date range
//! - Fixed-interval pacing between consecutive requests
//! - Linear backoff between retry attempts
//! - Cooperative cancellation of a running crawl

use crate::config::CrawlerConfig;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inclusive, ascending range of calendar days
///
/// Weekends and holidays are included; the source simply has no trades for them.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range from `start` to `end`, both included
    ///
    /// An inverted range yields nothing.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }
}

/// Shared cancellation flag for one crawl
///
/// Cloning hands out another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the crawl to stop before its next page
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Paces requests and spaces out retries
///
/// Requests are spaced at least `request_interval` apart, measured from the
/// start of the previous request. The first request goes out immediately.
pub struct Scheduler {
    /// Minimum spacing between two requests
    interval: Duration,

    /// When the previous request was released
    last_request: Option<Instant>,

    /// Extra attempts allowed for a retryable failure
    max_retries: u32,

    /// Base retry delay, scaled by the attempt number
    retry_delay: Duration,

    /// Pagination bound per date
    max_pages_per_date: u32,
}

impl Scheduler {
    /// Creates a scheduler from crawler settings
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.request_interval),
            last_request: None,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay),
            max_pages_per_date: config.max_pages_per_date,
        }
    }

    /// Time left before the next request may go out
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request?;
        let ready_at = last + self.interval;
        (ready_at > now).then(|| ready_at - now)
    }

    /// Waits until the pacing interval has elapsed, then claims the slot
    pub async fn wait_turn(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Pacing: waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }

    /// Waits out a retry backoff, then claims the slot like any other request
    ///
    /// The retry goes out after the longer of `backoff` and the remaining
    /// pacing interval.
    pub async fn wait_retry(&mut self, backoff: Duration) {
        let now = Instant::now();
        let wait = self
            .time_until_next_request(now)
            .map_or(backoff, |pacing| pacing.max(backoff));
        tracing::trace!("Retry: waiting {:?} before next attempt", wait);
        tokio::time::sleep(wait).await;
        self.last_request = Some(Instant::now());
    }

    /// Delay before retry number `attempt` (1-based), or `None` once retries are spent
    pub fn retry_backoff(&self, attempt: u32) -> Option<Duration> {
        (attempt <= self.max_retries).then(|| self.retry_delay * attempt)
    }

    /// Returns true while `page` is within the per-date bound
    pub fn page_allowed(&self, page: u32) -> bool {
        page <= self.max_pages_per_date
    }
}

use crate::RequestError;
use chrono::NaiveDate;

/// Validated, immutable input to one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl CrawlRequest {
    /// Validates a ticker and an inclusive date range
    ///
    /// The ticker is trimmed and lower-cased (the source expects `sz000001`,
    /// not `SZ000001`). An empty ticker is rejected rather than replaced by
    /// a default symbol.
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Self, RequestError> {
        let ticker = ticker.trim().to_ascii_lowercase();

        if ticker.is_empty() {
            return Err(RequestError::EmptyTicker);
        }

        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(RequestError::InvalidTicker(ticker));
        }

        if end < start {
            return Err(RequestError::InvalidRange { start, end });
        }

        Ok(Self { ticker, start, end })
    }

    /// Parses `YYYY-MM-DD` dates, then validates like [`CrawlRequest::new`]
    ///
    /// ```
    /// use sina_tick_crawler::CrawlRequest;
    ///
    /// let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();
    /// assert_eq!(request.days(), 1);
    /// assert!(CrawlRequest::parse("sz000001", "2021-04-28", "2021-04-27").is_err());
    /// ```
    pub fn parse(ticker: &str, start: &str, end: &str) -> Result<Self, RequestError> {
        Self::new(ticker, parse_date(start)?, parse_date(end)?)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days the crawl will walk
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Parses a strict `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        value: value.to_string(),
    })
}

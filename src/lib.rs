//! Sina-Tick-Crawler: intraday trade history harvester
//!
//! This crate walks a date range day by day, paginates through the Sina
//! finance trade-history tables for one ticker, and turns every table row
//! into a [`TradeRecord`]. Results can be exported to CSV or summarised.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid crawl request: {0}")]
    Request(#[from] RequestError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl worker stopped unexpectedly: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while validating a crawl request, before any work starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Ticker symbol cannot be empty")]
    EmptyTicker,

    #[error("Ticker symbol '{0}' contains invalid characters")]
    InvalidTicker(String),

    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("End date {end} is earlier than start date {start}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Transport-level failures while fetching one page
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Returns true if the failure is transient and worth another attempt
    ///
    /// Timeouts, refused connections, HTTP 5xx and HTTP 429 are retried;
    /// everything else is fatal on the first occurrence.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { code, .. } => *code == 429 || (500..600).contains(code),
            Self::Body { .. } | Self::Other { .. } => false,
        }
    }
}

/// Why a single table row could not become a trade record
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RowError {
    #[error("Row is missing header cell {0}")]
    MissingHeaderCell(usize),

    #[error("Row is missing data cell {0}")]
    MissingDataCell(usize),

    #[error("Trade price '{0}' is not a number")]
    InvalidPrice(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, CrawlRequest, Crawler};
pub use state::{ProgressEvent, RecordStore, TradeRecord};

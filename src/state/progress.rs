//! Progress events emitted while a crawl runs
//!
//! Events are pure observability: the crawler never reads them back, and a
//! sink that drops them does not change what gets collected.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// One human-readable status update
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A page is about to be requested
    Page {
        /// Local wall-clock time the event was raised
        at: NaiveDateTime,
        ticker: String,
        date: NaiveDate,
        page: u32,
    },

    /// The run stopped on a fatal fetch error
    Failed {
        date: NaiveDate,
        page: u32,
        message: String,
    },

    /// The run was cancelled before finishing its schedule
    Cancelled,

    /// Every date in the range has been walked
    Finished,
}

impl ProgressEvent {
    /// Builds a page event stamped with the current local time
    pub fn page(ticker: &str, date: NaiveDate, page: u32) -> Self {
        Self::Page {
            at: chrono::Local::now().naive_local(),
            ticker: ticker.to_string(),
            date,
            page,
        }
    }

    /// Returns true for the event that closes a run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Page { .. })
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page {
                at,
                ticker,
                date,
                page,
            } => write!(
                f,
                "{}<-:->{}:{}:{}",
                at.format("%Y-%m-%d %H:%M:%S"),
                ticker,
                date.format("%Y-%m-%d"),
                page
            ),
            Self::Failed {
                date,
                page,
                message,
            } => write!(f, "Error at {}:{}: {}", date.format("%Y-%m-%d"), page, message),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Finished => write!(f, "Finish"),
        }
    }
}

/// Observer receiving progress events in emission order
pub trait ProgressSink: Send + Sync {
    /// Delivers one event; must not block the crawl
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events over an unbounded tokio channel
///
/// A closed receiver is ignored: the crawl keeps going without an audience.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

/// Writes every event to the log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        tracing::info!("{}", event);
    }
}

/// Discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

//! State module for a single crawl run
//!
//! # Components
//!
//! - `TradeRecord` / `RecordStore`: parsed trades and the append-only buffer holding them
//! - `PageCursor`: transient state for one (date, page) fetch-parse cycle
//! - `ProgressEvent` / `ProgressSink`: human-readable status stream for observers

mod page_cursor;
mod progress;
mod record_store;

// Re-export main types
pub use page_cursor::PageCursor;
pub use progress::{ChannelSink, NullSink, ProgressEvent, ProgressSink, TracingSink};
pub use record_store::{RecordStore, TradeRecord};

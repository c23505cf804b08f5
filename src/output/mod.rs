//! Output module for collected trade records
//!
//! This module handles:
//! - Exporting a record store to a BOM-prefixed UTF-8 CSV file
//! - Summarising trade prices (max / mean / min)

mod csv_export;
pub mod stats;

pub use csv_export::{export_csv, export_file_name, export_to_directory, CSV_HEADER};
pub use stats::{print_summary, PriceSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No records collected yet; crawl data first")]
    NoRecords,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

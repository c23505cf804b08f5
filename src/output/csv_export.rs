//! CSV export of a record store
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the right
//! encoding for the Chinese column titles and trade tags.

use crate::crawler::CrawlRequest;
use crate::output::{OutputError, OutputResult};
use crate::state::RecordStore;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column titles, in record field order
pub const CSV_HEADER: [&str; 6] = [
    "成交时间",
    "成交价",
    "价格变动",
    "成交量(手)",
    "成交额(元)",
    "性质",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes every record to `path`, replacing any file already there
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(OutputError::NoRecords)` - Store is empty; nothing is written
/// * `Err(OutputError)` - Failed to create or write the file
pub fn export_csv(records: &RecordStore, path: &Path) -> OutputResult<()> {
    if records.is_empty() {
        return Err(OutputError::NoRecords);
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;

    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// File name for a request's export: `<ticker>-<start>-<end>.csv`
pub fn export_file_name(request: &CrawlRequest) -> String {
    format!(
        "{}-{}-{}.csv",
        request.ticker(),
        request.start().format("%Y-%m-%d"),
        request.end().format("%Y-%m-%d")
    )
}

/// Exports into `directory` under the request's file name; returns the full path
pub fn export_to_directory(
    records: &RecordStore,
    request: &CrawlRequest,
    directory: &Path,
) -> OutputResult<PathBuf> {
    let path = directory.join(export_file_name(request));
    export_csv(records, &path)?;
    Ok(path)
}

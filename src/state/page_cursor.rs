/// Transient state for one (date, page) fetch-parse cycle
use crate::crawler::{parse_rows, TableRow};
use chrono::NaiveDate;

/// A fetched page, split into table rows
///
/// Lives only for the duration of one cycle; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct PageCursor {
    /// The date being walked
    pub date: NaiveDate,

    /// 1-based page number
    pub page: u32,

    /// Decoded response body
    pub body: String,

    rows: Vec<TableRow>,
}

impl PageCursor {
    /// Parses `body` into rows and wraps it with its position in the schedule
    pub fn from_body(date: NaiveDate, page: u32, body: String) -> Self {
        let rows = parse_rows(&body);
        Self {
            date,
            page,
            body,
            rows,
        }
    }

    /// Number of `<tr>` rows on the page, label row included
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the page carries no trade rows
    ///
    /// This is the only end-of-date signal the source gives: a page with
    /// just the label row, or nothing at all.
    pub fn is_exhausted(&self) -> bool {
        self.row_count() <= 1
    }

    /// Rows after the label row, in page order
    pub fn data_rows(&self) -> &[TableRow] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

//! HTML table parser for trade-history pages
//!
//! This module handles:
//! - Splitting a page into table rows in document order
//! - Separating each row's header (`<th>`) and data (`<td>`) cells
//! - Mapping one data row onto a `TradeRecord`

use crate::state::TradeRecord;
use crate::RowError;
use scraper::{ElementRef, Html, Selector};

/// One `<tr>` with its header and data cells kept apart, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    /// Text of each `<th>` cell
    pub headers: Vec<String>,

    /// Text of each `<td>` cell
    pub cells: Vec<String>,
}

/// Parses every table row out of an HTML document
///
/// Row 0 of the result is the table's label row; callers treat the rest as
/// trade data. A page with no table yields an empty vector rather than an
/// error, since the source answers out-of-range pages with an empty shell.
///
/// # Example
///
/// ```
/// use sina_tick_crawler::crawler::parse_rows;
///
/// let html = "<table><tr><th>时间</th></tr><tr><th>09:25:00</th><td>11.58</td></tr></table>";
/// let rows = parse_rows(html);
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].cells, vec!["11.58".to_string()]);
/// ```
pub fn parse_rows(html: &str) -> Vec<TableRow> {
    let document = Html::parse_document(html);

    let (Ok(row_selector), Ok(th_selector), Ok(td_selector)) = (
        Selector::parse("tr"),
        Selector::parse("th"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .map(|row| TableRow {
            headers: cell_texts(&row, &th_selector),
            cells: cell_texts(&row, &td_selector),
        })
        .collect()
}

/// Collects the trimmed text of every cell matching `selector` inside `row`
fn cell_texts(row: &ElementRef<'_>, selector: &Selector) -> Vec<String> {
    row.select(selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

/// Maps one data row onto a trade record
///
/// Column contract of the source table:
///
/// | Cell | Field |
/// |------|-------|
/// | `th[0]` | trade time |
/// | `td[0]` | trade price (numeric) |
/// | `td[1]` | price change |
/// | `td[2]` | volume (lots) |
/// | `td[3]` | value (yuan) |
/// | `th[1]` | trade nature |
pub fn parse_record(row: &TableRow) -> Result<TradeRecord, RowError> {
    let header = |i: usize| {
        row.headers
            .get(i)
            .cloned()
            .ok_or(RowError::MissingHeaderCell(i))
    };
    let cell = |i: usize| row.cells.get(i).ok_or(RowError::MissingDataCell(i));

    let time = header(0)?;
    let price = parse_price(cell(0)?)?;
    let change = cell(1)?.clone();
    let volume = cell(2)?.clone();
    let value = cell(3)?.clone();
    let direction = header(1)?;

    Ok(TradeRecord {
        time,
        price,
        change,
        volume,
        value,
        direction,
    })
}

/// Parses a price cell; anything but a finite decimal is rejected
fn parse_price(text: &str) -> Result<f64, RowError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| RowError::InvalidPrice(text.to_string()))
}

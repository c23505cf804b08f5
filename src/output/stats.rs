//! Price statistics over collected trades
//!
//! This module provides the max / mean / min summary of trade prices and a
//! plain-text rendering for the terminal.

use crate::state::TradeRecord;

/// Summary of trade prices in a record set
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    /// Number of trades summarised
    pub count: usize,

    /// Highest trade price
    pub max: f64,

    /// Arithmetic mean of trade prices
    pub mean: f64,

    /// Lowest trade price
    pub min: f64,
}

impl PriceSummary {
    /// Summarises the prices of `records`
    ///
    /// Returns `None` for an empty record set.
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;

        for record in records {
            count += 1;
            sum += record.price;
            max = max.max(record.price);
            min = min.min(record.price);
        }

        (count > 0).then(|| Self {
            count,
            max,
            mean: sum / count as f64,
            min,
        })
    }
}

/// Prints a price summary to stdout in a formatted manner
pub fn print_summary(summary: &PriceSummary) {
    println!("=== Trade Price Statistics ===\n");
    println!("  Trades: {}", summary.count);
    println!("  Max:    {:.2}", summary.max);
    println!("  Mean:   {:.4}", summary.mean);
    println!("  Min:    {:.2}", summary.min);
}

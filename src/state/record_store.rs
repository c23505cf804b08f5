/// Trade records and the per-run store that accumulates them
use std::ops::Index;

/// One intraday trade as listed by the source
///
/// Every field is present; rows that cannot fill all six are never built.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    /// Trade time, at whatever granularity the source prints (e.g. `14:56:59`)
    pub time: String,

    /// Trade price
    pub price: f64,

    /// Price change text as shown by the source (e.g. `+0.01`, `--`)
    pub change: String,

    /// Traded volume in lots
    pub volume: String,

    /// Traded value in yuan
    pub value: String,

    /// Trade nature tag (buy / sell / neutral, in the source's wording)
    pub direction: String,
}

impl TradeRecord {
    /// Returns the six fields as strings in export column order
    pub fn to_row(&self) -> [String; 6] {
        [
            self.time.clone(),
            self.price.to_string(),
            self.change.clone(),
            self.volume.clone(),
            self.value.clone(),
            self.direction.clone(),
        ]
    }
}

/// Ordered, append-only sequence of trade records for one crawl
///
/// Insertion order is discovery order: date ascending, then page, then row.
/// There is no API to remove, sort or deduplicate records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<TradeRecord>,
}

impl RecordStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record at the end of the store
    pub fn push(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record has been collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.records.iter()
    }

    /// Read-only view of all records
    pub fn as_slice(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Consumes the store and returns the underlying records
    pub fn into_vec(self) -> Vec<TradeRecord> {
        self.records
    }
}

impl Index<usize> for RecordStore {
    type Output = TradeRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a TradeRecord;
    type IntoIter = std::slice::Iter<'a, TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Extend<TradeRecord> for RecordStore {
    fn extend<T: IntoIterator<Item = TradeRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

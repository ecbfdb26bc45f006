//! One decoded line of a tick file.

use serde::{Deserialize, Serialize};

use super::TimeKey;

/// Index of the input file a record came from. Fixed for the whole run.
pub type FileIndex = usize;

/// A single top-of-book quote with fixed-point prices.
///
/// Prices are in hundredths of a currency unit; quantities are whole units.
/// Built once by the reader, consumed once by the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ticker: String,
    pub time: TimeKey,
    pub bid: i64,
    pub ask: i64,
    pub bid_qty: i64,
    pub ask_qty: i64,
    pub ltp: i64,
    pub origin: FileIndex,
}

impl QuoteRecord {
    /// Sort key used by the merge queue.
    pub fn time_key(&self) -> TimeKey {
        self.time
    }
}

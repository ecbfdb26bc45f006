//! Tick file line → QuoteRecord.
//!
//! Field layout (comma separated):
//! `ticker,date,time,ltp,buyPrice,buyQty,sellPrice,sellQty,ltq,openInterest`
//!
//! `ltq` and `openInterest` must be numeric but are not kept.

use thiserror::Error;

use super::fixed_point::{price_to_fixed, quantity_to_int, validate_number, FixedPointError};
use super::time_key::encode_time_key;
use crate::domain::{FileIndex, QuoteRecord};

/// Column names in file order.
pub const INPUT_COLUMNS: [&str; 10] = [
    "ticker",
    "date",
    "time",
    "ltp",
    "buyPrice",
    "buyQty",
    "sellPrice",
    "sellQty",
    "ltq",
    "openInterest",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineParseError {
    #[error("expected 10 fields, found {found}")]
    MissingFields { found: usize },

    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("field '{field}': {source}")]
    Field {
        field: &'static str,
        #[source]
        source: FixedPointError,
    },
}

/// Parse one data line (no trailing newline) into a quote tagged with `origin`.
pub fn parse_quote_line(line: &str, origin: FileIndex) -> Result<QuoteRecord, LineParseError> {
    let mut fields = [""; 10];
    let mut found = 0;
    for (slot, value) in fields.iter_mut().zip(line.split(',')) {
        *slot = value;
        found += 1;
    }
    if found < fields.len() {
        return Err(LineParseError::MissingFields { found });
    }

    let field = |i: usize| {
        let name = INPUT_COLUMNS[i];
        move |source| LineParseError::Field { field: name, source }
    };

    let ltp = price_to_fixed(fields[3]).map_err(field(3))?;
    let bid = price_to_fixed(fields[4]).map_err(field(4))?;
    let bid_qty = quantity_to_int(fields[5]).map_err(field(5))?;
    let ask = price_to_fixed(fields[6]).map_err(field(6))?;
    let ask_qty = quantity_to_int(fields[7]).map_err(field(7))?;
    validate_number(fields[8]).map_err(field(8))?;
    validate_number(fields[9]).map_err(field(9))?;

    Ok(QuoteRecord {
        ticker: fields[0].to_string(),
        time: encode_time_key(fields[1], fields[2]),
        bid,
        ask,
        bid_qty,
        ask_qty,
        ltp,
        origin,
    })
}

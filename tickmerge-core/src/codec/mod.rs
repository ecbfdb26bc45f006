//! Text → numeric codecs for tick file lines

pub mod fixed_point;
pub mod line;
pub mod time_key;

pub use fixed_point::{price_to_fixed, quantity_to_int, FixedPointError, PRICE_SCALE};
pub use line::{parse_quote_line, LineParseError, INPUT_COLUMNS};
pub use time_key::{encode_time_key, try_encode_time_key, TimeKeyError};

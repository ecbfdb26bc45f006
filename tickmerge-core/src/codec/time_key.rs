//! Date/time token → TimeKey conversion.
//!
//! Two flavours:
//! - [`encode_time_key`]: lenient, never fails. A missing or non-numeric
//!   component counts as 0, so malformed input yields a silently wrong key.
//!   This is what the reader uses on the hot path.
//! - [`try_encode_time_key`]: strict, validates the calendar date and clock
//!   time and reports what was wrong.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use thiserror::Error;

use crate::domain::TimeKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeKeyError {
    #[error("invalid date '{0}' (expected D/M/YYYY)")]
    InvalidDate(String),

    #[error("invalid time '{0}' (expected H:M:S)")]
    InvalidTime(String),

    #[error("year {0} does not fit in four digits")]
    YearOutOfRange(i32),
}

/// Encode `D/M/Y` + `H:Mi:S` into a [`TimeKey`].
///
/// ```
/// use tickmerge_core::codec::encode_time_key;
///
/// assert_eq!(encode_time_key("05/03/2024", "09:15:30").value(), 20240305091530);
/// ```
pub fn encode_time_key(date: &str, time: &str) -> TimeKey {
    let [day, month, year] = split_fields(date, '/');
    let [hour, minute, second] = split_fields(time, ':');
    TimeKey::from_parts(year, month, day, hour, minute, second)
}

/// Strict variant of [`encode_time_key`].
pub fn try_encode_time_key(date: &str, time: &str) -> Result<TimeKey, TimeKeyError> {
    let d = NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y")
        .map_err(|_| TimeKeyError::InvalidDate(date.to_string()))?;
    if !(1000..=9999).contains(&d.year()) {
        return Err(TimeKeyError::YearOutOfRange(d.year()));
    }
    let t = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .map_err(|_| TimeKeyError::InvalidTime(time.to_string()))?;

    Ok(TimeKey::from_parts(
        d.year() as i64,
        d.month() as i64,
        d.day() as i64,
        t.hour() as i64,
        t.minute() as i64,
        t.second() as i64,
    ))
}

fn split_fields(token: &str, sep: char) -> [i64; 3] {
    let mut out = [0i64; 3];
    for (slot, field) in out.iter_mut().zip(token.split(sep)) {
        *slot = leading_int(field);
    }
    out
}

/// Value of the leading `[+-]?digits` run of `s`, or 0 if there is none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if negative {
        -value
    } else {
        value
    }
}

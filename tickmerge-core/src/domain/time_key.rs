//! Composite integer key used to order quotes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digit weights for each calendar field: `YYYYMMDDHHMMSS` as one integer.
pub(crate) const YEAR_WEIGHT: i64 = 10_000_000_000;
pub(crate) const MONTH_WEIGHT: i64 = 100_000_000;
pub(crate) const DAY_WEIGHT: i64 = 1_000_000;
pub(crate) const HOUR_WEIGHT: i64 = 10_000;
pub(crate) const MINUTE_WEIGHT: i64 = 100;

/// Event time encoded as `Y*10^10 + M*10^8 + D*10^6 + H*10^4 + Mi*10^2 + S`.
///
/// Ordering of keys matches chronological ordering as long as every field
/// stays within its digit width. The value carries no arithmetic meaning:
/// subtracting two keys does not give a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeKey(pub i64);

impl TimeKey {
    pub const MIN: TimeKey = TimeKey(i64::MIN);
    pub const MAX: TimeKey = TimeKey(i64::MAX);

    /// Compose a key from already-split fields. No range checks: fields too
    /// wide for their digits give a meaningless key, wrapping on i64 overflow.
    pub fn from_parts(year: i64, month: i64, day: i64, hour: i64, minute: i64, second: i64) -> Self {
        Self(
            year.wrapping_mul(YEAR_WEIGHT)
                .wrapping_add(month.wrapping_mul(MONTH_WEIGHT))
                .wrapping_add(day.wrapping_mul(DAY_WEIGHT))
                .wrapping_add(hour.wrapping_mul(HOUR_WEIGHT))
                .wrapping_add(minute.wrapping_mul(MINUTE_WEIGHT))
                .wrapping_add(second),
        )
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Split the key back into `(year, month, day, hour, minute, second)`.
    pub fn parts(self) -> (i64, i64, i64, i64, i64, i64) {
        let v = self.0;
        (
            v / YEAR_WEIGHT,
            (v / MONTH_WEIGHT) % 100,
            (v / DAY_WEIGHT) % 100,
            (v / HOUR_WEIGHT) % 100,
            (v / MINUTE_WEIGHT) % 100,
            v % 100,
        )
    }

    /// Decode into a calendar instant, if the key denotes one.
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        if self.0 < 0 {
            return None;
        }
        let (y, mo, d, h, mi, s) = self.parts();
        NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, mo as u32, d as u32)?
            .and_hms_opt(h as u32, mi as u32, s as u32)
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimeKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(TimeKey)
    }
}

impl From<i64> for TimeKey {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

//! Decimal token → fixed-point integer conversion.
//!
//! Prices are scaled by 100 and rounded half-up (toward +∞ on a tie);
//! quantities are truncated toward zero. Plain decimal tokens are handled
//! with exact integer arithmetic, so `"123.455"` is exactly half a hundredth
//! above `123.45` and rounds to `12346`. Exponent notation falls back to `f64`.

use thiserror::Error;

/// Implied decimal places of a fixed-point price.
pub const PRICE_SCALE: i64 = 100;

/// Fractional digits kept when parsing; anything beyond is ignored.
const MAX_FRACTION_DIGITS: u32 = 18;

/// Integer digits accepted before the value is considered out of range.
const MAX_INTEGER_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedPointError {
    #[error("empty numeric field")]
    Empty,

    #[error("not a number: '{0}'")]
    Invalid(String),

    #[error("number out of range: '{0}'")]
    OutOfRange(String),
}

/// Convert a decimal price token to hundredths, rounding half-up.
///
/// ```
/// use tickmerge_core::codec::price_to_fixed;
///
/// assert_eq!(price_to_fixed("123.455").unwrap(), 12346);
/// assert_eq!(price_to_fixed("123.454").unwrap(), 12345);
/// ```
pub fn price_to_fixed(token: &str) -> Result<i64, FixedPointError> {
    match parse_decimal(token)? {
        Parsed::Exact { mantissa, scale } => {
            let denom = 10i128.pow(scale);
            // floor(N * 100 / 10^k + 1/2) == floor((2 * N * 100 + 10^k) / (2 * 10^k))
            let numer = mantissa
                .checked_mul(2 * PRICE_SCALE as i128)
                .and_then(|n| n.checked_add(denom))
                .ok_or_else(|| FixedPointError::OutOfRange(token.to_string()))?;
            narrow(numer.div_euclid(2 * denom), token)
        }
        Parsed::Float(v) => float_to_i64((v * PRICE_SCALE as f64 + 0.5).floor(), token),
    }
}

/// Convert a decimal quantity token to an integer, truncating toward zero.
///
/// ```
/// use tickmerge_core::codec::quantity_to_int;
///
/// assert_eq!(quantity_to_int("7.9").unwrap(), 7);
/// ```
pub fn quantity_to_int(token: &str) -> Result<i64, FixedPointError> {
    match parse_decimal(token)? {
        Parsed::Exact { mantissa, scale } => narrow(mantissa / 10i128.pow(scale), token),
        Parsed::Float(v) => float_to_i64(v.trunc(), token),
    }
}

/// Check that a token is numeric without keeping its value.
pub fn validate_number(token: &str) -> Result<(), FixedPointError> {
    parse_decimal(token).map(|_| ())
}

enum Parsed {
    /// `mantissa / 10^scale`
    Exact { mantissa: i128, scale: u32 },
    Float(f64),
}

fn parse_decimal(token: &str) -> Result<Parsed, FixedPointError> {
    let s = token.trim();
    if s.is_empty() {
        return Err(FixedPointError::Empty);
    }
    if s.contains(['e', 'E']) {
        let v: f64 = s
            .parse()
            .map_err(|_| FixedPointError::Invalid(token.to_string()))?;
        if !v.is_finite() {
            return Err(FixedPointError::OutOfRange(token.to_string()));
        }
        return Ok(Parsed::Float(v));
    }

    let (negative, body) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(FixedPointError::Invalid(token.to_string()));
    }
    if int_part.trim_start_matches('0').len() > MAX_INTEGER_DIGITS {
        return Err(FixedPointError::OutOfRange(token.to_string()));
    }

    let mut mantissa: i128 = 0;
    for b in int_part.bytes() {
        mantissa = mantissa * 10 + (b - b'0') as i128;
    }
    let mut scale = 0u32;
    for b in frac_part.bytes().take(MAX_FRACTION_DIGITS as usize) {
        mantissa = mantissa * 10 + (b - b'0') as i128;
        scale += 1;
    }
    if negative {
        mantissa = -mantissa;
    }
    Ok(Parsed::Exact { mantissa, scale })
}

fn narrow(v: i128, token: &str) -> Result<i64, FixedPointError> {
    i64::try_from(v).map_err(|_| FixedPointError::OutOfRange(token.to_string()))
}

fn float_to_i64(v: f64, token: &str) -> Result<i64, FixedPointError> {
    if v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return Err(FixedPointError::OutOfRange(token.to_string()));
    }
    Ok(v as i64)
}

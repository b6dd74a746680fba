//! Fixed-point price and quantity scalars.
//!
//! Both types store an `i64` mantissa with 8 implied decimal places
//! (`raw / 10^8`), matching the precision Binance quotes at. Arithmetic
//! happens on the raw integer; `f64` conversion is for ingestion and
//! display only. Decimal strings from the wire are parsed directly to a
//! mantissa without a float intermediate to avoid cross-platform drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// Scaling factor: 1 unit = 10^-8 of the quoted asset.
pub const SCALE: i64 = 100_000_000;

/// Number of implied decimal places.
pub const DECIMAL_PLACES: u32 = 8;

/// Largest whole-unit magnitude representable without overflowing `i64`.
const MAX_WHOLE_UNITS: f64 = 9.2e10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDecimalError {
    #[error("empty decimal string")]
    Empty,
    #[error("malformed decimal: {0}")]
    Malformed(String),
    #[error("decimal out of range: {0}")]
    OutOfRange(String),
}

/// Parse a decimal string like `"90000.12"` directly to an 8-decimal
/// mantissa (no float intermediate). Digits beyond the 8th fractional
/// place round half-up.
pub fn parse_decimal_8(s: &str) -> Result<i64, ParseDecimalError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseDecimalError::Empty);
    }

    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let mut parts = s.splitn(3, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if parts.next().is_some() || int_part.is_empty() && frac_part.is_empty() {
        return Err(ParseDecimalError::Malformed(s.to_string()));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseDecimalError::Malformed(s.to_string()));
    }

    let target = DECIMAL_PLACES as usize;
    let mut mantissa = String::with_capacity(int_part.len() + target);
    mantissa.push_str(int_part);

    let mut round_up = false;
    if frac_part.len() >= target {
        mantissa.push_str(&frac_part[..target]);
        if let Some(next) = frac_part.as_bytes().get(target) {
            round_up = *next >= b'5';
        }
    } else {
        mantissa.push_str(frac_part);
        for _ in 0..(target - frac_part.len()) {
            mantissa.push('0');
        }
    }

    let mut value: i64 = mantissa
        .parse()
        .map_err(|_| ParseDecimalError::OutOfRange(s.to_string()))?;
    if round_up {
        value = value
            .checked_add(1)
            .ok_or_else(|| ParseDecimalError::OutOfRange(s.to_string()))?;
    }
    Ok(if negative { -value } else { value })
}

/// Convert a float to a raw mantissa: NaN/inf map to 0, magnitudes beyond
/// the representable range saturate.
fn f64_to_raw(v: f64) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    if v > MAX_WHOLE_UNITS {
        return i64::MAX;
    }
    if v < -MAX_WHOLE_UNITS {
        return i64::MIN + 1;
    }
    (v * SCALE as f64).round() as i64
}

macro_rules! fixed_scalar {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const ZERO: Self = Self(0);

            #[inline]
            pub const fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            #[inline]
            pub fn from_f64(v: f64) -> Self {
                Self(f64_to_raw(v))
            }

            /// Parse a wire decimal string without a float intermediate.
            pub fn parse(s: &str) -> Result<Self, ParseDecimalError> {
                parse_decimal_8(s).map(Self)
            }

            #[inline]
            pub const fn raw(self) -> i64 {
                self.0
            }

            /// Display/boundary conversion only.
            #[inline]
            pub fn to_f64(self) -> f64 {
                self.0 as f64 / SCALE as f64
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }

            #[inline]
            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.8}", self.to_f64())
            }
        }
    };
}

fixed_scalar!(Price, "A price with 8 implied decimal places. Valid iff raw > 0.");
fixed_scalar!(
    Quantity,
    "A base-asset amount with 8 implied decimal places. Signed to permit shorts."
);

impl Quantity {
    /// Size a position from a USD value at a given price
    /// (e.g. $100 at $50,000 = 0.002 BTC).
    pub fn from_usd_value(usd_value: f64, price: f64) -> Self {
        if price <= 0.0 {
            return Self::ZERO;
        }
        Self::from_f64(usd_value / price)
    }
}

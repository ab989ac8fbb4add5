//! Arbitrary-precision reals for partial sums and the final estimate.
//!
//! Partial sums are accumulated exactly: each f64 sample is converted to its
//! exact decimal expansion and added without rounding. The wire form is a
//! plain decimal numeral with no precision cap, so a sum survives
//! serialization bit-for-bit. Division is the only rounding operation and
//! keeps [`DIVISION_DIGITS`] significant digits.

use bigdecimal::{BigDecimal, Zero};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

use crate::error::{PiError, PiResult};

/// Significant digits kept by [`PreciseReal::checked_div`].
pub const DIVISION_DIGITS: u64 = 100;

/// Exact decimal real backed by [`BigDecimal`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreciseReal(BigDecimal);

impl Default for PreciseReal {
    fn default() -> Self {
        Self::zero()
    }
}

impl PreciseReal {
    /// Exact zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    /// Exact decimal expansion of a finite f64.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::NonFiniteValue`] for NaN or infinities, naming
    /// `location` as the source.
    pub fn from_f64(value: f64, location: impl Into<String>) -> PiResult<Self> {
        if !value.is_finite() {
            return Err(PiError::NonFiniteValue {
                location: location.into(),
            });
        }
        Ok(Self(exact_decimal(value)))
    }

    /// Exact value of an unsigned integer.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(BigDecimal::from(value))
    }

    /// Parse a decimal numeral (plain or exponent form).
    ///
    /// # Errors
    ///
    /// Returns [`PiError::ResultParse`] if `text` is not a decimal numeral.
    /// Never defaults to zero.
    pub fn parse(text: &str) -> PiResult<Self> {
        if text.trim().is_empty() {
            return Err(PiError::result_parse(text, "empty numeral"));
        }
        BigDecimal::from_str(text)
            .map(Self)
            .map_err(|e| PiError::result_parse(text, e))
    }

    /// Plain decimal rendering (no exponent) used on the wire.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        self.0.to_plain_string()
    }

    /// Add `value` in place, exactly.
    pub fn accumulate(&mut self, value: &Self) {
        self.0 += value.0.clone();
    }

    /// Divide, rounding to [`DIVISION_DIGITS`] significant digits.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::MonteCarlo`] if `divisor` is zero.
    pub fn checked_div(&self, divisor: &Self) -> PiResult<Self> {
        if divisor.is_zero() {
            return Err(PiError::MonteCarlo(format!(
                "cannot divide {} by zero",
                self.to_wire_string()
            )));
        }
        let quotient = &self.0 / &divisor.0;
        let rounded = if quotient.digits() > DIVISION_DIGITS {
            quotient.with_prec(DIVISION_DIGITS)
        } else {
            quotient
        };
        Ok(Self(rounded.normalized()))
    }

    /// Whether the value is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Nearest f64, if representable.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        self.to_wire_string().parse().ok()
    }
}

/// Exact decimal expansion of a finite binary64 value.
///
/// A finite f64 is `mantissa * 2^exp2`; for negative `exp2` that equals
/// `mantissa * 5^-exp2 / 10^-exp2`, which is representable without rounding.
fn exact_decimal(value: f64) -> BigDecimal {
    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & 0x000f_ffff_ffff_ffff;
    let (mantissa, exp2) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    };

    let mut digits = BigInt::from(mantissa);
    let scale = if exp2 >= 0 {
        digits <<= exp2 as usize;
        0
    } else {
        digits *= BigInt::from(5u8).pow((-exp2) as u32);
        -exp2
    };
    if negative {
        digits = -digits;
    }
    BigDecimal::new(digits, scale).normalized()
}

impl From<BigDecimal> for PreciseReal {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl FromStr for PreciseReal {
    type Err = PiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PreciseReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl Add for &PreciseReal {
    type Output = PreciseReal;

    fn add(self, rhs: Self) -> PreciseReal {
        PreciseReal(&self.0 + &rhs.0)
    }
}

impl Mul for &PreciseReal {
    type Output = PreciseReal;

    fn mul(self, rhs: Self) -> PreciseReal {
        PreciseReal(&self.0 * &rhs.0)
    }
}

impl<'a> std::iter::Sum<&'a PreciseReal> for PreciseReal {
    fn sum<I: Iterator<Item = &'a PreciseReal>>(iter: I) -> Self {
        iter.fold(Self::zero(), |mut acc, v| {
            acc.accumulate(v);
            acc
        })
    }
}

impl Serialize for PreciseReal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl<'de> Deserialize<'de> for PreciseReal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

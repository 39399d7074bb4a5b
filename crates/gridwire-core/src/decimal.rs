//! Arbitrary-precision decimal values.
//!
//! A [`Decimal`] is an unscaled integer and a scale: `unscaled * 10^-scale`.
//! Equality is structural, so `1.0` and `1.00` are different values.
//!
//! # Wire magnitude
//!
//! The wire carries the magnitude of the unscaled value as big-endian bytes in
//! minimal two's-complement form (a leading zero byte appears when the top bit
//! of the magnitude is set). A negative value sets the top bit of the first
//! byte instead of using two's complement. See [`Decimal::wire_magnitude`].

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use thiserror::Error;

/// Error returned when a decimal literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal: {0}")]
pub struct ParseDecimalError(String);

/// An arbitrary-precision signed decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

impl Decimal {
    /// Create a decimal from an unscaled value and a scale.
    #[must_use]
    pub fn new(unscaled: impl Into<BigInt>, scale: i32) -> Self {
        Self { unscaled: unscaled.into(), scale }
    }

    /// The unscaled integer value.
    #[must_use]
    pub const fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    /// Digits to the right of the decimal point.
    #[must_use]
    pub const fn scale(&self) -> i32 {
        self.scale
    }

    /// Returns `true` if the value is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.unscaled.sign() == Sign::Minus
    }

    /// Magnitude bytes as written on the wire, with the sign folded into the
    /// top bit of the first byte.
    #[must_use]
    pub fn wire_magnitude(&self) -> Vec<u8> {
        let magnitude = BigInt::from_biguint(Sign::Plus, self.unscaled.magnitude().clone());
        let mut bytes = magnitude.to_signed_bytes_be();
        if self.is_negative() {
            bytes[0] |= 0x80;
        }
        bytes
    }

    /// Rebuilds a decimal from its wire scale and magnitude bytes.
    #[must_use]
    pub fn from_wire_parts(scale: i32, magnitude: &[u8]) -> Self {
        let Some((&first, rest)) = magnitude.split_first() else {
            return Self::new(0, scale);
        };
        let negative = first & 0x80 != 0;
        let mut bytes = Vec::with_capacity(magnitude.len());
        bytes.push(first & 0x7F);
        bytes.extend_from_slice(rest);
        let abs = BigUint::from_bytes_be(&bytes);
        let sign = if abs.is_zero() {
            Sign::NoSign
        } else if negative {
            Sign::Minus
        } else {
            Sign::Plus
        };
        Self { unscaled: BigInt::from_biguint(sign, abs), scale }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl From<i128> for Decimal {
    fn from(value: i128) -> Self {
        Self::new(value, 0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Parses `[-+]digits[.digits][(e|E)[-+]digits]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_owned());

        let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => {
                let exp = s[idx + 1..].parse::<i32>().map_err(|_| err())?;
                (&s[..idx], exp)
            }
            None => (s, 0),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };

        let digits_part = int_part.trim_start_matches(|c: char| c == '-' || c == '+');
        if digits_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !digits_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit())
            || int_part.len() - digits_part.len() > 1
        {
            return Err(err());
        }

        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);
        let unscaled = BigInt::from_str(&digits).map_err(|_| err())?;

        let frac_len = i32::try_from(frac_part.len()).map_err(|_| err())?;
        let scale = frac_len.checked_sub(exponent).ok_or_else(err)?;
        Ok(Self { unscaled, scale })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.magnitude().to_string();
        let sign = if self.is_negative() { "-" } else { "" };

        if self.scale <= 0 {
            let zeros =
                if self.unscaled.is_zero() { 0 } else { self.scale.unsigned_abs() as usize };
            return write!(f, "{sign}{digits}{}", "0".repeat(zeros));
        }

        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

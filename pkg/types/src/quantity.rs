use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a quantity string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must not be empty")]
    Empty,
    #[error("quantity '{0}' has no digits")]
    NoDigits(String),
    #[error("quantity '{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("quantity '{0}' has an invalid exponent")]
    InvalidExponent(String),
    #[error("quantity '{input}' has unknown suffix '{suffix}'")]
    UnknownSuffix { input: String, suffix: String },
}

/// Decimal SI suffixes and the power of ten they stand for.
const DECIMAL_SUFFIXES: &[(&str, i64)] = &[
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

/// Largest accepted magnitude of an `e<int>` exponent.
pub const MAX_EXPONENT: u64 = 1024;

/// Binary suffixes and the power of two they stand for.
const BINARY_SUFFIXES: &[(&str, u32)] = &[
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

/// An exact decimal resource amount, written the Kubernetes way
/// (`500m`, `2`, `1Gi`, `1.5e3`).
///
/// Backed by an arbitrary-precision decimal: parsing never rounds, and
/// comparison is numeric (`1000m == 1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(BigDecimal);

impl Quantity {
    pub fn from_decimal(value: BigDecimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_decimal(self) -> BigDecimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(BigDecimal::zero())
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

/// `value * 10^exp`, exact.
fn shift(value: BigDecimal, exp: i64) -> BigDecimal {
    value * BigDecimal::new(BigInt::one(), -exp)
}

fn apply_suffix(
    value: BigDecimal,
    suffix: &str,
    input: &str,
) -> Result<BigDecimal, QuantityError> {
    if let Some(&(_, bits)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Ok(value * BigDecimal::from(1u64 << bits));
    }
    // "E" alone is exa; "E3" is an exponent
    if let Some(&(_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Ok(shift(value, exp));
    }
    if let Some(exp) = suffix.strip_prefix(['e', 'E']) {
        let exp = exp
            .parse::<i64>()
            .ok()
            .filter(|e| e.unsigned_abs() <= MAX_EXPONENT)
            .ok_or_else(|| QuantityError::InvalidExponent(input.to_string()))?;
        return Ok(shift(value, exp));
    }
    Err(QuantityError::UnknownSuffix {
        input: input.to_string(),
        suffix: suffix.to_string(),
    })
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match input.as_bytes()[0] {
            b'+' => (false, &input[1..]),
            b'-' => (true, &input[1..]),
            _ => (false, input),
        };
        let end = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(end);

        if !number.bytes().any(|b| b.is_ascii_digit()) {
            return Err(QuantityError::NoDigits(input.to_string()));
        }
        if number.matches('.').count() > 1 {
            return Err(QuantityError::InvalidNumber(input.to_string()));
        }

        let mut digits = String::with_capacity(number.len() + 2);
        if negative {
            digits.push('-');
        }
        if number.starts_with('.') {
            digits.push('0');
        }
        digits.push_str(number.trim_end_matches('.'));

        let value = BigDecimal::from_str(&digits)
            .map_err(|_| QuantityError::InvalidNumber(input.to_string()))?;
        Ok(Self(apply_suffix(value, suffix, input)?))
    }
}

/// Canonical decimal-SI rendering: the largest suffix that keeps the
/// mantissa integral. Amounts finer than nano (or beyond exa) fall back
/// to an exponent, so every value renders exactly.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            return f.write_str("0");
        }
        let (mantissa, scale) = self.0.normalized().into_bigint_and_exponent();
        let exp10 = -scale;
        let suffix_exp = exp10.div_euclid(3) * 3;
        match DECIMAL_SUFFIXES.iter().find(|(_, e)| *e == suffix_exp) {
            Some((suffix, e)) => {
                let zeros = "0".repeat((exp10 - e) as usize);
                write!(f, "{}{}{}", mantissa, zeros, suffix)
            }
            None => write!(f, "{}e{}", mantissa, exp10),
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string such as \"500m\" or \"2Gi\", or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        Ok(Quantity(BigDecimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        Ok(Quantity(BigDecimal::from(v)))
    }

    // Display of an f64 is its shortest round-trip text, i.e. the literal
    // as written in the document.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

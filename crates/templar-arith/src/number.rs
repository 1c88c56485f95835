/*
 * number.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The closed set of numeric representations.
//!
//! Template arithmetic works over a small tagged union of numeric types:
//! two native integer widths, two native float widths, and two
//! arbitrary-precision forms. [`NumericClass`] defines the total order used
//! to pick a promotion target when two representations are combined.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{ArithmeticError, ArithmeticResult};

/// A number in one of the supported representations.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// 32-bit native integer.
    Int(i32),

    /// 64-bit native integer.
    Long(i64),

    /// 32-bit native float.
    Float(f32),

    /// 64-bit native float.
    Double(f64),

    /// Arbitrary-precision integer.
    BigInt(BigInt),

    /// Arbitrary-precision decimal.
    Decimal(BigDecimal),
}

/// The internal total order over numeric representations.
///
/// Used to decide the promotion target of a binary operation: the result
/// class is derived from `max(class(a), class(b))`, with a few documented
/// exceptions applied on top (see the engine implementations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericClass {
    Int,
    Long,
    Float,
    Double,
    BigInt,
    Decimal,
}

impl NumericClass {
    /// Human-readable name of the representation, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            NumericClass::Int => "int",
            NumericClass::Long => "long",
            NumericClass::Float => "float",
            NumericClass::Double => "double",
            NumericClass::BigInt => "arbitrary-precision integer",
            NumericClass::Decimal => "arbitrary-precision decimal",
        }
    }
}

/// Non-finite float values, extracted so comparison can normalize them
/// across bit widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NonFinite {
    NegInfinity,
    PosInfinity,
    Nan,
}

impl Number {
    /// The representation class of this number.
    pub fn class(&self) -> NumericClass {
        match self {
            Number::Int(_) => NumericClass::Int,
            Number::Long(_) => NumericClass::Long,
            Number::Float(_) => NumericClass::Float,
            Number::Double(_) => NumericClass::Double,
            Number::BigInt(_) => NumericClass::BigInt,
            Number::Decimal(_) => NumericClass::Decimal,
        }
    }

    /// Whether this number is a non-finite float, and which one.
    pub(crate) fn non_finite(&self) -> Option<NonFinite> {
        let (is_nan, is_infinite, is_negative) = match self {
            Number::Float(f) => (f.is_nan(), f.is_infinite(), f.is_sign_negative()),
            Number::Double(d) => (d.is_nan(), d.is_infinite(), d.is_sign_negative()),
            _ => return None,
        };
        if is_nan {
            Some(NonFinite::Nan)
        } else if is_infinite {
            if is_negative {
                Some(NonFinite::NegInfinity)
            } else {
                Some(NonFinite::PosInfinity)
            }
        } else {
            None
        }
    }

    /// Lossy conversion to `f64`.
    ///
    /// BigInt/Decimal values outside the double range saturate to infinity,
    /// matching native widening behavior.
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(i) => f64::from(*i),
            Number::Long(l) => *l as f64,
            Number::Float(f) => f64::from(*f),
            Number::Double(d) => *d,
            Number::BigInt(b) => b.to_f64().unwrap_or(f64::INFINITY),
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::INFINITY),
        }
    }

    /// Exact conversion to an arbitrary-precision decimal.
    ///
    /// Fails for non-finite floats, which have no decimal expansion.
    pub fn to_decimal(&self) -> ArithmeticResult<BigDecimal> {
        match self {
            Number::Int(i) => Ok(BigDecimal::from(*i)),
            Number::Long(l) => Ok(BigDecimal::from(*l)),
            Number::Float(f) => {
                BigDecimal::try_from(f64::from(*f)).map_err(|_| non_finite_error(self))
            }
            Number::Double(d) => BigDecimal::try_from(*d).map_err(|_| non_finite_error(self)),
            Number::BigInt(b) => Ok(BigDecimal::from(b.clone())),
            Number::Decimal(d) => Ok(d.clone()),
        }
    }

    /// Exact conversion to an arbitrary-precision integer, if this number
    /// has no fractional part.
    pub fn to_bigint_exact(&self) -> Option<BigInt> {
        match self {
            Number::Int(i) => Some(BigInt::from(*i)),
            Number::Long(l) => Some(BigInt::from(*l)),
            Number::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                BigInt::from_f64(f64::from(*f))
            }
            Number::Double(d) if d.fract() == 0.0 && d.is_finite() => BigInt::from_f64(*d),
            Number::BigInt(b) => Some(b.clone()),
            Number::Decimal(d) if d.is_integer() => {
                let (digits, scale) = d.normalized().as_bigint_and_exponent();
                // normalized() guarantees scale <= 0 for integral values
                Some(digits * BigInt::from(10u32).pow(u32::try_from(-scale).ok()?))
            }
            _ => None,
        }
    }

    /// Narrow an `i64` into the smallest native integer representation.
    pub fn narrowed_long(value: i64) -> Number {
        match i32::try_from(value) {
            Ok(v) => Number::Int(v),
            Err(_) => Number::Long(value),
        }
    }

    /// Whether this number equals zero in its own representation.
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::Long(l) => *l == 0,
            Number::Float(f) => *f == 0.0,
            Number::Double(d) => *d == 0.0,
            Number::BigInt(b) => num_traits::Zero::is_zero(b),
            Number::Decimal(d) => num_traits::Zero::is_zero(d),
        }
    }
}

use num_traits::FromPrimitive;

fn non_finite_error(n: &Number) -> ArithmeticError {
    ArithmeticError::UnsupportedOperation {
        operation: format!("exact decimal conversion of {n}"),
        representation: n.class().name().to_string(),
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Long(l) => write!(f, "{l}"),
            Number::Float(v) => write!(f, "{v}"),
            Number::Double(v) => write!(f, "{v}"),
            Number::BigInt(b) => write!(f, "{b}"),
            Number::Decimal(d) => write!(f, "{}", d.normalized()),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Long(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::BigInt(value)
    }
}

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::Decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_class_order() {
        assert!(NumericClass::Int < NumericClass::Long);
        assert!(NumericClass::Long < NumericClass::Float);
        assert!(NumericClass::Float < NumericClass::Double);
        assert!(NumericClass::Double < NumericClass::BigInt);
        assert!(NumericClass::BigInt < NumericClass::Decimal);
    }

    #[test]
    fn test_narrowed_long() {
        assert_eq!(Number::narrowed_long(7), Number::Int(7));
        assert_eq!(
            Number::narrowed_long(i64::from(i32::MAX) + 1),
            Number::Long(i64::from(i32::MAX) + 1)
        );
        assert_eq!(Number::narrowed_long(i64::from(i32::MIN)), Number::Int(i32::MIN));
    }

    #[test]
    fn test_non_finite_extraction() {
        assert_eq!(Number::Double(f64::NAN).non_finite(), Some(NonFinite::Nan));
        assert_eq!(
            Number::Float(f32::NEG_INFINITY).non_finite(),
            Some(NonFinite::NegInfinity)
        );
        assert_eq!(
            Number::Double(f64::INFINITY).non_finite(),
            Some(NonFinite::PosInfinity)
        );
        assert_eq!(Number::Double(1.5).non_finite(), None);
        assert_eq!(Number::Int(3).non_finite(), None);
    }

    #[test]
    fn test_to_bigint_exact() {
        assert_eq!(Number::Int(5).to_bigint_exact(), Some(BigInt::from(5)));
        assert_eq!(Number::Double(2.0).to_bigint_exact(), Some(BigInt::from(2)));
        assert_eq!(Number::Double(2.5).to_bigint_exact(), None);
        let d = BigDecimal::from_str("120.00").unwrap();
        assert_eq!(Number::Decimal(d).to_bigint_exact(), Some(BigInt::from(120)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Int(42).to_string(), "42");
        assert_eq!(Number::Double(1.5).to_string(), "1.5");
        let d = BigDecimal::from_str("3.1400").unwrap();
        assert_eq!(Number::Decimal(d).to_string(), "3.14");
    }
}

/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arithmetic engine flavors.
//!
//! Two engines implement the same trait with different promotion policies:
//!
//! - [`ConservativeEngine`] prefers the narrowest native type that avoids
//!   overflow, promoting int → long → arbitrary-precision integer when a
//!   native add/subtract/multiply would wrap.
//! - [`DecimalEngine`] always computes in arbitrary-precision decimal. It is
//!   the default flavor for template math, trading performance for never
//!   losing precision.

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::compare;
use crate::error::{ArithmeticError, ArithmeticResult};
use crate::number::{Number, NumericClass};

/// Minimum decimal scale used when dividing two arbitrary-precision decimals.
const MIN_DIVISION_SCALE: i64 = 12;

/// Flush threshold guard for decimal division scale; keeps the result scale
/// bounded by the operand scales without dropping below the minimum.
fn division_scale(a: &BigDecimal, b: &BigDecimal) -> i64 {
    let (_, scale_a) = a.as_bigint_and_exponent();
    let (_, scale_b) = b.as_bigint_and_exponent();
    scale_a.max(scale_b).max(MIN_DIVISION_SCALE)
}

/// A binary arithmetic operation, used in promotion decisions and error
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Add => "addition",
            Operation::Subtract => "subtraction",
            Operation::Multiply => "multiplication",
            Operation::Divide => "division",
            Operation::Modulo => "modulus",
        }
    }
}

/// Arithmetic over heterogeneous numeric representations.
///
/// Implementations decide how operands are promoted and which representation
/// the result takes. Comparison semantics are shared between flavors.
pub trait ArithmeticEngine: Send + Sync {
    /// Compare two numbers, with signed zero and infinity normalization.
    fn cmp(&self, a: &Number, b: &Number) -> Ordering {
        compare::compare(a, b)
    }

    /// Add two numbers.
    fn add(&self, a: &Number, b: &Number) -> ArithmeticResult<Number>;

    /// Subtract `b` from `a`.
    fn subtract(&self, a: &Number, b: &Number) -> ArithmeticResult<Number>;

    /// Multiply two numbers.
    fn multiply(&self, a: &Number, b: &Number) -> ArithmeticResult<Number>;

    /// Divide `a` by `b`.
    fn divide(&self, a: &Number, b: &Number) -> ArithmeticResult<Number>;

    /// Compute the remainder of `a` divided by `b`.
    fn modulo(&self, a: &Number, b: &Number) -> ArithmeticResult<Number>;

    /// Parse a decimal-looking string into the engine's natural numeric type.
    fn parse_number(&self, text: &str) -> ArithmeticResult<Number>;
}

/// Parse the special float literals shared by both engine flavors.
///
/// `INF`, `-INF`, `Infinity`, `-Infinity` and `NaN` are matched
/// case-sensitively and always map to the double representation.
fn parse_special(text: &str) -> Option<Number> {
    match text {
        "INF" | "Infinity" => Some(Number::Double(f64::INFINITY)),
        "-INF" | "-Infinity" => Some(Number::Double(f64::NEG_INFINITY)),
        "NaN" => Some(Number::Double(f64::NAN)),
        _ => None,
    }
}

fn looks_integral(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The operand pair after promotion to a common representation.
enum Promoted {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
    BigInt(BigInt, BigInt),
    Decimal(BigDecimal, BigDecimal),
}

/// Promote a pair of numbers per the conservative policy.
///
/// The target starts as the maximum of the two classes, then the documented
/// exceptions apply: combining a 32-bit float with a 64-bit integer promotes
/// to double, and combining any native float with an arbitrary-precision
/// integer promotes both to arbitrary-precision decimal.
fn promote_conservative(a: &Number, b: &Number) -> ArithmeticResult<Promoted> {
    use NumericClass::*;
    let (ca, cb) = (a.class(), b.class());
    let target = match (ca.min(cb), ca.max(cb)) {
        (Long, Float) => Double,
        (Float | Double, BigInt) => Decimal,
        (_, hi) => hi,
    };
    promote_to(a, b, target)
}

fn promote_to(a: &Number, b: &Number, target: NumericClass) -> ArithmeticResult<Promoted> {
    Ok(match target {
        NumericClass::Int => match (a, b) {
            (Number::Int(x), Number::Int(y)) => Promoted::Int(*x, *y),
            _ => unreachable!("int is only a target for int pairs"),
        },
        NumericClass::Long => Promoted::Long(as_i64(a), as_i64(b)),
        NumericClass::Float => Promoted::Float(as_f32(a), as_f32(b)),
        NumericClass::Double => Promoted::Double(a.to_f64(), b.to_f64()),
        NumericClass::BigInt => Promoted::BigInt(
            a.to_bigint_exact()
                .ok_or_else(|| unexpected_fraction(a))?,
            b.to_bigint_exact()
                .ok_or_else(|| unexpected_fraction(b))?,
        ),
        NumericClass::Decimal => Promoted::Decimal(a.to_decimal()?, b.to_decimal()?),
    })
}

fn as_i64(n: &Number) -> i64 {
    match n {
        Number::Int(i) => i64::from(*i),
        Number::Long(l) => *l,
        _ => unreachable!("long is only a target for native integer pairs"),
    }
}

fn as_f32(n: &Number) -> f32 {
    match n {
        Number::Int(i) => *i as f32,
        Number::Float(f) => *f,
        _ => unreachable!("float is only a target for int/float pairs"),
    }
}

fn unexpected_fraction(n: &Number) -> ArithmeticError {
    ArithmeticError::UnsupportedOperation {
        operation: format!("integer promotion of {n}"),
        representation: n.class().name().to_string(),
    }
}

/// Engine that prefers the narrowest native type avoiding overflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeEngine;

impl ConservativeEngine {
    fn binary(&self, op: Operation, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        match promote_conservative(a, b)? {
            // Native int arithmetic runs in 64 bits; a result that no longer
            // fits 32 bits promotes to long instead of wrapping.
            Promoted::Int(x, y) => {
                let (x, y) = (i64::from(x), i64::from(y));
                let r = match op {
                    Operation::Add => x + y,
                    Operation::Subtract => x - y,
                    Operation::Multiply => x * y,
                    Operation::Divide | Operation::Modulo => {
                        return int_div_mod(op, x, y);
                    }
                };
                Ok(Number::narrowed_long(r))
            }
            Promoted::Long(x, y) => match op {
                Operation::Add => Ok(checked_long(x.checked_add(y), || {
                    BigInt::from(x) + BigInt::from(y)
                })),
                Operation::Subtract => Ok(checked_long(x.checked_sub(y), || {
                    BigInt::from(x) - BigInt::from(y)
                })),
                Operation::Multiply => Ok(checked_long(x.checked_mul(y), || {
                    BigInt::from(x) * BigInt::from(y)
                })),
                Operation::Divide | Operation::Modulo => int_div_mod(op, x, y),
            },
            Promoted::Float(x, y) => Ok(Number::Float(float_op(op, x, y))),
            Promoted::Double(x, y) => Ok(Number::Double(double_op(op, x, y))),
            Promoted::BigInt(x, y) => big_int_op(op, x, y),
            Promoted::Decimal(x, y) => decimal_op(op, &x, &y),
        }
    }
}

fn checked_long(checked: Option<i64>, widen: impl FnOnce() -> BigInt) -> Number {
    match checked {
        Some(v) => Number::Long(v),
        None => Number::BigInt(widen()),
    }
}

/// Integer division produces a floating result only when the division would
/// lose a remainder.
fn int_div_mod(op: Operation, x: i64, y: i64) -> ArithmeticResult<Number> {
    if y == 0 {
        return Err(ArithmeticError::DivisionByZero {
            operation: op.name().to_string(),
        });
    }
    match op {
        Operation::Divide => {
            if x % y == 0 {
                Ok(Number::narrowed_long(x / y))
            } else {
                Ok(Number::Double(x as f64 / y as f64))
            }
        }
        Operation::Modulo => Ok(Number::narrowed_long(x % y)),
        _ => unreachable!("int_div_mod only handles divide and modulo"),
    }
}

fn float_op(op: Operation, x: f32, y: f32) -> f32 {
    match op {
        Operation::Add => x + y,
        Operation::Subtract => x - y,
        Operation::Multiply => x * y,
        Operation::Divide => x / y,
        Operation::Modulo => x % y,
    }
}

fn double_op(op: Operation, x: f64, y: f64) -> f64 {
    match op {
        Operation::Add => x + y,
        Operation::Subtract => x - y,
        Operation::Multiply => x * y,
        Operation::Divide => x / y,
        Operation::Modulo => x % y,
    }
}

fn big_int_op(op: Operation, x: BigInt, y: BigInt) -> ArithmeticResult<Number> {
    match op {
        Operation::Add => Ok(Number::BigInt(x + y)),
        Operation::Subtract => Ok(Number::BigInt(x - y)),
        Operation::Multiply => Ok(Number::BigInt(x * y)),
        Operation::Divide => {
            if y.is_zero() {
                return Err(ArithmeticError::DivisionByZero {
                    operation: op.name().to_string(),
                });
            }
            if (&x % &y).is_zero() {
                Ok(Number::BigInt(x / y))
            } else {
                let (x, y) = (BigDecimal::from(x), BigDecimal::from(y));
                decimal_op(Operation::Divide, &x, &y)
            }
        }
        Operation::Modulo => {
            if y.is_zero() {
                return Err(ArithmeticError::DivisionByZero {
                    operation: op.name().to_string(),
                });
            }
            Ok(Number::BigInt(x % y))
        }
    }
}

fn decimal_op(op: Operation, x: &BigDecimal, y: &BigDecimal) -> ArithmeticResult<Number> {
    match op {
        Operation::Add => Ok(Number::Decimal(x + y)),
        Operation::Subtract => Ok(Number::Decimal(x - y)),
        Operation::Multiply => Ok(Number::Decimal(x * y)),
        Operation::Divide => {
            if y.is_zero() {
                return Err(ArithmeticError::DivisionByZero {
                    operation: op.name().to_string(),
                });
            }
            let scale = division_scale(x, y);
            Ok(Number::Decimal((x / y).with_scale_round(scale, RoundingMode::HalfUp)))
        }
        // Decimal remainder is ill-defined without an explicit scale policy.
        Operation::Modulo => Err(ArithmeticError::UnsupportedOperation {
            operation: op.name().to_string(),
            representation: NumericClass::Decimal.name().to_string(),
        }),
    }
}

impl ArithmeticEngine for ConservativeEngine {
    fn add(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Add, a, b)
    }

    fn subtract(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Subtract, a, b)
    }

    fn multiply(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Multiply, a, b)
    }

    fn divide(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Divide, a, b)
    }

    fn modulo(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Modulo, a, b)
    }

    fn parse_number(&self, text: &str) -> ArithmeticResult<Number> {
        if let Some(special) = parse_special(text) {
            return Ok(special);
        }
        if looks_integral(text) {
            if let Ok(i) = text.parse::<i32>() {
                return Ok(Number::Int(i));
            }
            if let Ok(l) = text.parse::<i64>() {
                return Ok(Number::Long(l));
            }
            if let Ok(b) = BigInt::from_str(text) {
                return Ok(Number::BigInt(b));
            }
        }
        text.parse::<f64>()
            .map(Number::Double)
            .map_err(|_| ArithmeticError::ParseError {
                text: text.to_string(),
            })
    }
}

/// Engine that always computes in arbitrary-precision decimal.
///
/// Non-finite doubles have no decimal expansion, so operations involving
/// them fall back to double arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalEngine;

impl DecimalEngine {
    fn binary(&self, op: Operation, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        if a.non_finite().is_some() || b.non_finite().is_some() {
            return Ok(Number::Double(double_op(op, a.to_f64(), b.to_f64())));
        }
        decimal_op(op, &a.to_decimal()?, &b.to_decimal()?)
    }
}

impl ArithmeticEngine for DecimalEngine {
    fn add(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Add, a, b)
    }

    fn subtract(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Subtract, a, b)
    }

    fn multiply(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Multiply, a, b)
    }

    fn divide(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Divide, a, b)
    }

    fn modulo(&self, a: &Number, b: &Number) -> ArithmeticResult<Number> {
        self.binary(Operation::Modulo, a, b)
    }

    fn parse_number(&self, text: &str) -> ArithmeticResult<Number> {
        if let Some(special) = parse_special(text) {
            return Ok(special);
        }
        BigDecimal::from_str(text)
            .map(Number::Decimal)
            .map_err(|_| ArithmeticError::ParseError {
                text: text.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eng() -> ConservativeEngine {
        ConservativeEngine
    }

    #[test]
    fn test_int_overflow_promotes_to_long() {
        let r = eng().add(&Number::Int(i32::MAX), &Number::Int(1)).unwrap();
        assert_eq!(r, Number::Long(i64::from(i32::MAX) + 1));

        let r = eng()
            .subtract(&Number::Int(i32::MIN), &Number::Int(1))
            .unwrap();
        assert_eq!(r, Number::Long(i64::from(i32::MIN) - 1));
    }

    #[test]
    fn test_long_overflow_promotes_to_bigint() {
        let r = eng().add(&Number::Long(i64::MAX), &Number::Long(1)).unwrap();
        assert_eq!(r, Number::BigInt(BigInt::from(i64::MAX) + 1));

        let r = eng()
            .multiply(&Number::Long(i64::MAX), &Number::Long(2))
            .unwrap();
        assert_eq!(r, Number::BigInt(BigInt::from(i64::MAX) * 2));
    }

    #[test]
    fn test_narrow_results_stay_narrow() {
        assert_eq!(eng().add(&Number::Int(2), &Number::Int(3)).unwrap(), Number::Int(5));
        assert_eq!(
            eng().add(&Number::Long(2), &Number::Long(3)).unwrap(),
            Number::Long(5)
        );
    }

    #[test]
    fn test_exact_division_stays_integral() {
        assert_eq!(eng().divide(&Number::Int(10), &Number::Int(2)).unwrap(), Number::Int(5));
        let r = eng().divide(&Number::Int(10), &Number::Int(4)).unwrap();
        assert_eq!(r, Number::Double(2.5));
    }

    #[test]
    fn test_float_long_promotes_to_double() {
        let r = eng().add(&Number::Float(0.5), &Number::Long(1)).unwrap();
        assert_eq!(r, Number::Double(1.5));
    }

    #[test]
    fn test_float_int_stays_float() {
        let r = eng().add(&Number::Float(0.5), &Number::Int(1)).unwrap();
        assert_eq!(r, Number::Float(1.5));
    }

    #[test]
    fn test_double_bigint_promotes_to_decimal() {
        let r = eng()
            .add(&Number::Double(0.5), &Number::BigInt(BigInt::from(2)))
            .unwrap();
        assert_eq!(r, Number::Decimal(BigDecimal::from_str("2.5").unwrap()));
    }

    #[test]
    fn test_decimal_modulo_rejected() {
        let a = Number::Decimal(BigDecimal::from(7));
        let b = Number::Decimal(BigDecimal::from(2));
        let err = eng().modulo(&a, &b).unwrap_err();
        assert!(matches!(err, ArithmeticError::UnsupportedOperation { .. }));
        let err = DecimalEngine.modulo(&Number::Int(7), &Number::Int(2)).unwrap_err();
        assert!(matches!(err, ArithmeticError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_division_by_zero() {
        let err = eng().divide(&Number::Int(1), &Number::Int(0)).unwrap_err();
        assert!(matches!(err, ArithmeticError::DivisionByZero { .. }));
        // Float division by zero follows IEEE semantics instead.
        let r = eng().divide(&Number::Double(1.0), &Number::Double(0.0)).unwrap();
        assert_eq!(r, Number::Double(f64::INFINITY));
    }

    #[test]
    fn test_decimal_engine_division_scale() {
        let r = DecimalEngine.divide(&Number::Int(1), &Number::Int(3)).unwrap();
        assert_eq!(
            r,
            Number::Decimal(BigDecimal::from_str("0.333333333333").unwrap())
        );
    }

    #[test]
    fn test_parse_special_literals() {
        for engine in [&eng() as &dyn ArithmeticEngine, &DecimalEngine] {
            assert_eq!(engine.parse_number("INF").unwrap(), Number::Double(f64::INFINITY));
            assert_eq!(
                engine.parse_number("-Infinity").unwrap(),
                Number::Double(f64::NEG_INFINITY)
            );
            assert!(matches!(engine.parse_number("NaN").unwrap(), Number::Double(d) if d.is_nan()));
            // Case-sensitive: lowercase forms are not special.
            assert!(engine.parse_number("inf").is_err());
            assert!(engine.parse_number("nan").is_err());
        }
    }

    #[test]
    fn test_parse_natural_types() {
        assert_eq!(eng().parse_number("42").unwrap(), Number::Int(42));
        assert_eq!(
            eng().parse_number("9999999999").unwrap(),
            Number::Long(9_999_999_999)
        );
        assert!(matches!(
            eng().parse_number("99999999999999999999999999").unwrap(),
            Number::BigInt(_)
        ));
        assert_eq!(eng().parse_number("1.5").unwrap(), Number::Double(1.5));
        assert_eq!(
            DecimalEngine.parse_number("1.5").unwrap(),
            Number::Decimal(BigDecimal::from_str("1.5").unwrap())
        );
    }

    #[test]
    fn test_promotion_commutative() {
        let pairs = [
            (Number::Int(1), Number::Long(2)),
            (Number::Float(1.0), Number::Long(2)),
            (Number::Double(1.0), Number::BigInt(BigInt::from(2))),
            (Number::Int(1), Number::Decimal(BigDecimal::from(2))),
        ];
        for (a, b) in &pairs {
            let ab = eng().add(a, b).unwrap();
            let ba = eng().add(b, a).unwrap();
            assert_eq!(ab.class(), ba.class(), "{a:?} vs {b:?}");
        }
    }
}

/*
 * properties.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Cross-representation comparison and promotion properties.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use templar_arith::{compare, ArithmeticEngine, ConservativeEngine, DecimalEngine, Number};

fn all_zeros() -> Vec<Number> {
    vec![
        Number::Int(0),
        Number::Long(0),
        Number::Float(0.0),
        Number::Float(-0.0),
        Number::Double(0.0),
        Number::Double(-0.0),
        Number::BigInt(BigInt::from(0)),
        Number::Decimal(BigDecimal::from(0)),
    ]
}

#[test]
fn comparison_is_antisymmetric_across_representations() {
    let mut values = all_zeros();
    values.extend([
        Number::Int(i32::MIN),
        Number::Int(i32::MAX),
        Number::Long(i64::MIN),
        Number::Long(i64::MAX),
        Number::Float(f32::INFINITY),
        Number::Double(f64::NEG_INFINITY),
        Number::Double(f64::NAN),
        Number::Double(1e300),
        Number::BigInt(BigInt::from(10).pow(40)),
        Number::Decimal("0.1".parse().unwrap()),
    ]);
    for a in &values {
        for b in &values {
            assert_eq!(compare(a, b), compare(b, a).reverse(), "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn all_zero_representations_compare_equal() {
    let zeros = all_zeros();
    for a in &zeros {
        for b in &zeros {
            assert_eq!(compare(a, b), Ordering::Equal, "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn same_sign_infinities_compare_equal_across_widths() {
    assert_eq!(
        compare(&Number::Float(f32::INFINITY), &Number::Double(f64::INFINITY)),
        Ordering::Equal
    );
    assert_eq!(
        compare(&Number::Float(f32::NEG_INFINITY), &Number::Double(f64::NEG_INFINITY)),
        Ordering::Equal
    );
}

#[test]
fn positive_infinity_exceeds_any_finite_value() {
    let inf = Number::Double(f64::INFINITY);
    for finite in [
        Number::Int(i32::MAX),
        Number::Long(i64::MAX),
        Number::Double(f64::MAX),
        Number::BigInt(BigInt::from(10).pow(100)),
    ] {
        assert_eq!(compare(&inf, &finite), Ordering::Greater, "{finite:?}");
    }
}

#[test]
fn overflow_promotion_preserves_exact_values() {
    let engine = ConservativeEngine;
    // Every pair near the boundaries must come out value-exact in a wider type.
    for delta in 0..4i64 {
        let a = Number::Int(i32::MAX - delta as i32);
        let b = Number::Int(delta as i32 + 1);
        let sum = engine.add(&a, &b).unwrap();
        let expected = Number::Long(i64::from(i32::MAX) + 1);
        assert_eq!(compare(&sum, &expected), Ordering::Equal, "delta {delta}");
    }
    for delta in 0..4i64 {
        let a = Number::Long(i64::MIN + delta);
        let b = Number::Long(delta + 1);
        let diff = engine.subtract(&a, &b).unwrap();
        let expected = Number::BigInt(BigInt::from(i64::MIN) - 1);
        assert_eq!(compare(&diff, &expected), Ordering::Equal, "delta {delta}");
    }
}

#[test]
fn decimal_engine_keeps_exact_decimal_fractions() {
    let engine = DecimalEngine;
    // 0.1 + 0.2 is exactly 0.3 in decimal, unlike binary floating point.
    let a = engine.parse_number("0.1").unwrap();
    let b = engine.parse_number("0.2").unwrap();
    let sum = engine.add(&a, &b).unwrap();
    assert_eq!(sum, Number::Decimal("0.3".parse().unwrap()));
}

/*
 * compare.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Total ordering over heterogeneous numeric representations.
//!
//! The comparison normalizes the float edge cases before anything else:
//! `-0.0` compares equal to `+0.0`, infinities compare by sign regardless of
//! originating bit width, and NaN is ordered after positive infinity (and
//! equal to itself) so that the ordering stays total.

use std::cmp::Ordering;

use crate::number::{NonFinite, Number};

/// Compare two numbers across representations.
///
/// The result is antisymmetric: `compare(a, b) == compare(b, a).reverse()`
/// for all representable pairs.
pub fn compare(a: &Number, b: &Number) -> Ordering {
    match (a.non_finite(), b.non_finite()) {
        (Some(x), Some(y)) => compare_non_finite(x, y),
        (Some(NonFinite::Nan | NonFinite::PosInfinity), None) => Ordering::Greater,
        (Some(NonFinite::NegInfinity), None) => Ordering::Less,
        (None, Some(NonFinite::Nan | NonFinite::PosInfinity)) => Ordering::Less,
        (None, Some(NonFinite::NegInfinity)) => Ordering::Greater,
        (None, None) => compare_finite(a, b),
    }
}

fn compare_non_finite(a: NonFinite, b: NonFinite) -> Ordering {
    rank(a).cmp(&rank(b))
}

fn rank(n: NonFinite) -> i8 {
    match n {
        NonFinite::NegInfinity => -1,
        NonFinite::PosInfinity => 1,
        NonFinite::Nan => 2,
    }
}

fn compare_finite(a: &Number, b: &Number) -> Ordering {
    // Fast paths for the common same-representation cases.
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => return x.cmp(y),
        (Number::Long(x), Number::Long(y)) => return x.cmp(y),
        (Number::Int(x), Number::Long(y)) => return i64::from(*x).cmp(y),
        (Number::Long(x), Number::Int(y)) => return x.cmp(&i64::from(*y)),
        (Number::BigInt(x), Number::BigInt(y)) => return x.cmp(y),
        _ => {}
    }

    // Exact comparison through the decimal expansion. Finite floats always
    // have one, and signed zero collapses to plain zero on conversion.
    let x = a
        .to_decimal()
        .unwrap_or_else(|_| unreachable!("finite numbers have a decimal expansion"));
    let y = b
        .to_decimal()
        .unwrap_or_else(|_| unreachable!("finite numbers have a decimal expansion"));
    x.cmp(&y)
}

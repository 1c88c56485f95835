/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Numeric comparison and arithmetic engine for the Templar template engine.
//!
//! This crate defines a total ordering and arithmetic over heterogeneous
//! numeric representations (fixed-width integer/float types plus
//! arbitrary-precision integer/decimal), with overflow-safe promotion rules.
//!
//! Two engine flavors are provided:
//!
//! - [`ConservativeEngine`] keeps results in the narrowest native type that
//!   avoids overflow, promoting int → long → big integer on overflow.
//! - [`DecimalEngine`] computes everything in arbitrary-precision decimal.
//!   This is the default for template math, because template authors rarely
//!   reason about binary floating-point artifacts.
//!
//! # Example
//!
//! ```ignore
//! use templar_arith::{ArithmeticEngine, ConservativeEngine, Number};
//!
//! let engine = ConservativeEngine;
//! let sum = engine.add(&Number::Int(i32::MAX), &Number::Int(1))?;
//! // Overflow promoted to the next wider representation instead of wrapping
//! assert_eq!(sum, Number::Long(i32::MAX as i64 + 1));
//! ```

pub mod compare;
pub mod engine;
pub mod error;
pub mod number;

pub use compare::compare;
pub use engine::{ArithmeticEngine, ConservativeEngine, DecimalEngine, Operation};
pub use error::{ArithmeticError, ArithmeticResult};
pub use number::{Number, NumericClass};

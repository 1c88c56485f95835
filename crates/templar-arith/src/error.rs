/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for numeric comparison and arithmetic.

use thiserror::Error;

/// Errors that can occur during arithmetic operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    /// The operation is not defined for this numeric representation
    /// (e.g., modulus on two arbitrary-precision decimals, where the
    /// remainder is ill-defined without an explicit scale policy).
    #[error("Operation \"{operation}\" is unsupported for the {representation} representation")]
    UnsupportedOperation {
        operation: String,
        representation: String,
    },

    /// Integer division or modulus by zero.
    #[error("Division by zero in integer \"{operation}\"")]
    DivisionByZero { operation: String },

    /// A string could not be parsed as a number.
    #[error("Can't parse \"{text}\" as a number")]
    ParseError { text: String },
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

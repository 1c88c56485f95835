/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for value formatting.

use thiserror::Error;

use crate::date::DateKind;

/// Errors that can occur while building or applying a formatter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A `@name` format parameter referenced a custom format that was never
    /// registered.
    #[error("Undefined custom format: @{name}")]
    UndefinedCustomFormat { name: String },

    /// A custom format requires a parameter that was not supplied.
    #[error("Format parameter is required for format \"{format}\"")]
    MissingParameter { format: String },

    /// A format parameter string (or a part of it) could not be parsed.
    #[error("Malformed format parameter: \"{param}\"")]
    MalformedParameter { param: String },

    /// A subtype-specific date format was applied to a value of the wrong
    /// subtype.
    #[error("The \"{format}\" format can't represent a {} value", .kind.name())]
    WrongDateKind { format: String, kind: DateKind },

    /// The value is outside what this format can express (e.g. non-finite
    /// floats where a decimal expansion is required).
    #[error("Can't format value with \"{format}\": {reason}")]
    Unformattable { format: String, reason: String },
}

/// Result type for formatting operations.
pub type FormatResult<T> = Result<T, FormatError>;

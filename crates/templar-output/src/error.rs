/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for markup output handling.

use thiserror::Error;

/// Errors that can occur when combining markup values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    /// Two markup values bound to different output formats were combined.
    #[error("Can't concatenate markup of format {left} with markup of format {right}")]
    FormatMismatch { left: String, right: String },
}

/// Result type for markup output operations.
pub type OutputResult<T> = Result<T, OutputError>;

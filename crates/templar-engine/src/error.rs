/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template resolution and evaluation.

use std::sync::Arc;

use templar_arith::ArithmeticError;
use templar_format::FormatError;
use templar_model::ModelError;
use templar_output::OutputError;
use thiserror::Error;

/// A loader-level failure. "Not found" is not an error at this level; the
/// loader signals it with `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("I/O error while loading \"{name}\": {source}")]
    Io {
        name: String,
        source: Arc<std::io::Error>,
    },
}

/// Errors raised anywhere in the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A template name with an embedded NUL or ambiguous scheme delimiter,
    /// rejected before any I/O.
    #[error("Malformed template name: \"{name}\"")]
    MalformedName { name: String },

    /// `..` segments resolved past the template root.
    #[error("Template name \"{name}\" backs out of the root directory")]
    BackedOutOfRoot { name: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    /// Template source failed to parse.
    #[error("Parse error in \"{template}\" at line {line}: {message}")]
    Parse {
        template: String,
        line: usize,
        message: String,
    },

    /// A matcher chain with `on_no_match: Error` matched nothing.
    #[error("No template configuration rule matches \"{name}\"")]
    NoConfigMatch { name: String },

    /// An interpolation or directive read a value that does not exist and
    /// no default was given.
    #[error("The value of \"{path}\" is missing")]
    MissingValue { path: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

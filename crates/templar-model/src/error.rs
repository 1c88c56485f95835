/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for object model adaptation.

use thiserror::Error;

/// Errors raised while adapting host values or invoking host members.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A value of one capability was used where another was required.
    ///
    /// `hint` carries extra guidance for common mistakes, such as passing
    /// markup output where a plain string is expected.
    #[error("Expected a {expected} value, but got a {actual} value{}", .hint.as_deref().map(|h| format!(". Hint: {h}")).unwrap_or_default())]
    TypeMismatch {
        expected: String,
        actual: String,
        hint: Option<String>,
    },

    /// No overload of a host method accepts the given argument types, or the
    /// best-scoring candidates are ambiguously tied.
    #[error("No compatible overloaded member \"{name}\" for argument types ({})", .arg_types.join(", "))]
    NoCompatibleOverload { name: String, arg_types: Vec<String> },

    /// Overload resolution chose a member, but an argument still failed to
    /// coerce to the declared parameter type.
    #[error(
        "Argument {param_index} of \"{method}\" expects {expected}, but the actual value is a {actual}"
    )]
    ArgumentCoercion {
        method: String,
        param_index: usize,
        expected: String,
        actual: String,
    },

    /// A one-shot collection was traversed a second time.
    #[error("The collection can be listed only once")]
    ListedTwice,

    /// A key or member that does not exist on the host class.
    #[error("{class} has no member named \"{member}\"")]
    UnknownMember { class: String, member: String },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

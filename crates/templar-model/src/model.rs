/*
 * model.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template value model.
//!
//! Every value the evaluator touches is a [`Model`]: a trait object with
//! capability probes. A probe returns `Some` when the value supports that
//! capability; one adapter may answer several probes (a number is usually
//! also a scalar, a host object is usually a hash and a scalar). Probes are
//! how the evaluator asks "can I treat this as X" without downcasting.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use templar_arith::Number;
use templar_format::DateValue;
use templar_output::MarkupValue;

use crate::error::{ModelError, ModelResult};

/// A shared template value.
pub type Model = Arc<dyn TemplateModel>;

/// Base trait of all template values: capability probes plus a type name
/// used in error messages.
pub trait TemplateModel: fmt::Debug + Send + Sync {
    /// Runtime type name for diagnostics ("string", "number", "markup_output",
    /// the host class name, ...).
    fn type_name(&self) -> &str;

    fn as_scalar(&self) -> Option<&dyn ScalarModel> {
        None
    }

    fn as_number(&self) -> Option<&dyn NumberModel> {
        None
    }

    fn as_bool(&self) -> Option<&dyn BoolModel> {
        None
    }

    fn as_date(&self) -> Option<&dyn DateModel> {
        None
    }

    fn as_markup(&self) -> Option<&dyn MarkupModel> {
        None
    }

    fn as_hash(&self) -> Option<&dyn HashModel> {
        None
    }

    fn as_sequence(&self) -> Option<&dyn SequenceModel> {
        None
    }

    fn as_collection(&self) -> Option<&dyn CollectionModel> {
        None
    }

    fn as_callable(&self) -> Option<&dyn CallableModel> {
        None
    }
}

/// Text conversion.
pub trait ScalarModel {
    fn as_str(&self) -> Cow<'_, str>;
}

/// Numeric value access.
pub trait NumberModel {
    fn value(&self) -> Number;
}

/// Boolean value access.
pub trait BoolModel {
    fn value(&self) -> bool;
}

/// Date/time value access.
pub trait DateModel {
    fn value(&self) -> DateValue;
}

/// Already-escaped markup that must bypass auto-escaping.
pub trait MarkupModel {
    fn value(&self) -> &MarkupValue;
}

/// String-keyed access with a stable key order.
pub trait HashModel {
    /// Look up a member. `Ok(None)` means the key is absent; reading a
    /// present member may run host code, so it can fail in its own right.
    fn get(&self, key: &str) -> ModelResult<Option<Model>>;

    /// Keys in their defined order.
    fn keys(&self) -> Vec<String>;

    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// Indexed, re-iterable access.
pub trait SequenceModel {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<Model>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterable access. Unlike a sequence this makes no promise about repeated
/// traversal; one-shot collections fail their second traversal.
pub trait CollectionModel {
    fn iterate(&self) -> ModelResult<Vec<Model>>;
}

/// A value invocable with arguments.
pub trait CallableModel {
    fn call(&self, args: &[Model]) -> ModelResult<Model>;
}

/// Require the scalar capability, with a targeted hint when the value is
/// markup output.
pub fn expect_scalar(model: &dyn TemplateModel) -> ModelResult<&dyn ScalarModel> {
    match model.as_scalar() {
        Some(scalar) => Ok(scalar),
        None => {
            let hint = model.as_markup().map(|_| {
                "the value is auto-escaped markup; use its plain-text source instead".to_string()
            });
            Err(ModelError::TypeMismatch {
                expected: "string".to_string(),
                actual: model.type_name().to_string(),
                hint,
            })
        }
    }
}

/// Require the number capability.
pub fn expect_number(model: &dyn TemplateModel) -> ModelResult<Number> {
    match model.as_number() {
        Some(number) => Ok(number.value()),
        None => Err(ModelError::TypeMismatch {
            expected: "number".to_string(),
            actual: model.type_name().to_string(),
            hint: None,
        }),
    }
}

/// Require the boolean capability.
pub fn expect_bool(model: &dyn TemplateModel) -> ModelResult<bool> {
    match model.as_bool() {
        Some(boolean) => Ok(boolean.value()),
        None => Err(ModelError::TypeMismatch {
            expected: "boolean".to_string(),
            actual: model.type_name().to_string(),
            hint: None,
        }),
    }
}

/*
 * simple.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Plain-data adapters: strings, numbers, booleans, dates, markup,
//! insertion-ordered hashes, sequences, and one-shot collections.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use templar_arith::Number;
use templar_format::DateValue;
use templar_output::MarkupValue;

use crate::error::{ModelError, ModelResult};
use crate::model::{
    BoolModel, CallableModel, CollectionModel, DateModel, HashModel, MarkupModel, Model,
    NumberModel, ScalarModel, SequenceModel, TemplateModel,
};

/// A plain string.
#[derive(Debug)]
pub struct SimpleScalar(pub String);

impl TemplateModel for SimpleScalar {
    fn type_name(&self) -> &str {
        "string"
    }

    fn as_scalar(&self) -> Option<&dyn ScalarModel> {
        Some(self)
    }
}

impl ScalarModel for SimpleScalar {
    fn as_str(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.0)
    }
}

/// A number; also a scalar through its canonical text form.
#[derive(Debug)]
pub struct SimpleNumber(pub Number);

impl TemplateModel for SimpleNumber {
    fn type_name(&self) -> &str {
        "number"
    }

    fn as_number(&self) -> Option<&dyn NumberModel> {
        Some(self)
    }

    fn as_scalar(&self) -> Option<&dyn ScalarModel> {
        Some(self)
    }
}

impl NumberModel for SimpleNumber {
    fn value(&self) -> Number {
        self.0.clone()
    }
}

impl ScalarModel for SimpleNumber {
    fn as_str(&self) -> Cow<'_, str> {
        Cow::Owned(self.0.to_string())
    }
}

/// A boolean.
#[derive(Debug)]
pub struct SimpleBool(pub bool);

impl TemplateModel for SimpleBool {
    fn type_name(&self) -> &str {
        "boolean"
    }

    fn as_bool(&self) -> Option<&dyn BoolModel> {
        Some(self)
    }
}

impl BoolModel for SimpleBool {
    fn value(&self) -> bool {
        self.0
    }
}

/// A date value with its subtype.
#[derive(Debug)]
pub struct SimpleDate(pub DateValue);

impl TemplateModel for SimpleDate {
    fn type_name(&self) -> &str {
        "date"
    }

    fn as_date(&self) -> Option<&dyn DateModel> {
        Some(self)
    }
}

impl DateModel for SimpleDate {
    fn value(&self) -> DateValue {
        self.0.clone()
    }
}

/// Already-escaped markup output.
#[derive(Debug)]
pub struct SimpleMarkup(pub MarkupValue);

impl TemplateModel for SimpleMarkup {
    fn type_name(&self) -> &str {
        "markup_output"
    }

    fn as_markup(&self) -> Option<&dyn MarkupModel> {
        Some(self)
    }
}

impl MarkupModel for SimpleMarkup {
    fn value(&self) -> &MarkupValue {
        &self.0
    }
}

/// An insertion-ordered hash.
#[derive(Debug, Default)]
pub struct SimpleHash {
    entries: IndexMap<String, Model>,
}

impl SimpleHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Model) {
        self.entries.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Model) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge `other` into this hash. Keys keep their first insertion
    /// position; a colliding key keeps its slot but takes the later value.
    pub fn union(&mut self, other: &dyn HashModel) -> ModelResult<()> {
        for key in other.keys() {
            if let Some(value) = other.get(&key)? {
                self.entries.insert(key, value);
            }
        }
        Ok(())
    }
}

impl TemplateModel for SimpleHash {
    fn type_name(&self) -> &str {
        "hash"
    }

    fn as_hash(&self) -> Option<&dyn HashModel> {
        Some(self)
    }
}

impl HashModel for SimpleHash {
    fn get(&self, key: &str) -> ModelResult<Option<Model>> {
        Ok(self.entries.get(key).cloned())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A re-iterable sequence.
#[derive(Debug, Default)]
pub struct SimpleSequence {
    items: Vec<Model>,
}

impl SimpleSequence {
    pub fn new(items: Vec<Model>) -> Self {
        Self { items }
    }
}

impl TemplateModel for SimpleSequence {
    fn type_name(&self) -> &str {
        "sequence"
    }

    fn as_sequence(&self) -> Option<&dyn SequenceModel> {
        Some(self)
    }

    fn as_collection(&self) -> Option<&dyn CollectionModel> {
        Some(self)
    }
}

impl SequenceModel for SimpleSequence {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<Model> {
        self.items.get(index).cloned()
    }
}

impl CollectionModel for SimpleSequence {
    fn iterate(&self) -> ModelResult<Vec<Model>> {
        Ok(self.items.clone())
    }
}

/// A collection whose traversal is destructive: the first `iterate` consumes
/// the items, the second fails instead of silently yielding nothing.
#[derive(Debug)]
pub struct OneShotCollection {
    items: Mutex<Option<Vec<Model>>>,
}

impl OneShotCollection {
    pub fn new(items: Vec<Model>) -> Self {
        Self {
            items: Mutex::new(Some(items)),
        }
    }
}

impl TemplateModel for OneShotCollection {
    fn type_name(&self) -> &str {
        "one-shot collection"
    }

    fn as_collection(&self) -> Option<&dyn CollectionModel> {
        Some(self)
    }
}

impl CollectionModel for OneShotCollection {
    fn iterate(&self) -> ModelResult<Vec<Model>> {
        self.items.lock().take().ok_or(ModelError::ListedTwice)
    }
}

/// A callable backed by a closure; used for registered directives and tests.
pub struct SimpleCallable {
    name: String,
    body: Arc<dyn Fn(&[Model]) -> ModelResult<Model> + Send + Sync>,
}

impl SimpleCallable {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&[Model]) -> ModelResult<Model> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }
}

impl std::fmt::Debug for SimpleCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCallable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TemplateModel for SimpleCallable {
    fn type_name(&self) -> &str {
        "method"
    }

    fn as_callable(&self) -> Option<&dyn CallableModel> {
        Some(self)
    }
}

impl CallableModel for SimpleCallable {
    fn call(&self, args: &[Model]) -> ModelResult<Model> {
        (self.body)(args)
    }
}

/// The degenerate adapter for shapes nothing else covers: identity plus a
/// string conversion. Unknown shapes degrade gracefully, they never fail to
/// wrap.
#[derive(Debug)]
pub struct GenericModel {
    type_name: String,
    display: String,
}

impl GenericModel {
    pub fn new(type_name: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            display: display.into(),
        }
    }
}

impl TemplateModel for GenericModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_scalar(&self) -> Option<&dyn ScalarModel> {
        Some(self)
    }
}

impl ScalarModel for GenericModel {
    fn as_str(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.display)
    }
}

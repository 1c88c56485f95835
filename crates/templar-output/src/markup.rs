/*
 * markup.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The markup model: pre-escaped text bound to one output format.
//!
//! A [`MarkupValue`] holds either raw (already escaped) markup, or plain text
//! plus a lazily computed escaped form, never both absent. Once the escaped
//! form has been computed it is memoized.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{OutputError, OutputResult};
use crate::format::MarkupFormat;

/// Pre-escaped text bound to exactly one output format.
#[derive(Debug, Clone)]
pub struct MarkupValue {
    format: Arc<dyn MarkupFormat>,
    /// Original plain text, when this value was built from plain text.
    plain: Option<String>,
    /// Markup form; lazily derived from `plain` when absent.
    markup: OnceCell<String>,
}

impl MarkupValue {
    /// Build a markup value from plain text; escaping is deferred until the
    /// markup form is first needed.
    pub fn from_plain(format: Arc<dyn MarkupFormat>, plain: impl Into<String>) -> Self {
        Self {
            format,
            plain: Some(plain.into()),
            markup: OnceCell::new(),
        }
    }

    /// Wrap already-escaped markup as-is.
    pub fn from_markup(format: Arc<dyn MarkupFormat>, markup: impl Into<String>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(markup.into());
        Self {
            format,
            plain: None,
            markup: cell,
        }
    }

    /// The output format this value is bound to.
    pub fn format(&self) -> &Arc<dyn MarkupFormat> {
        &self.format
    }

    /// The original plain text, if this value still retains it.
    pub fn plain(&self) -> Option<&str> {
        self.plain.as_deref()
    }

    /// The markup form, escaping and memoizing on first access.
    pub fn markup(&self) -> &str {
        self.markup.get_or_init(|| {
            let plain = self
                .plain
                .as_deref()
                .unwrap_or_default();
            self.format.escape(plain)
        })
    }

    /// Emptiness test that avoids forcing escaping when the plain form is
    /// still available.
    pub fn is_empty(&self) -> bool {
        match (&self.plain, self.markup.get()) {
            (Some(plain), _) => plain.is_empty(),
            (None, Some(markup)) => markup.is_empty(),
            (None, None) => true,
        }
    }

    /// Concatenate two markup values of the same format.
    ///
    /// When both operands still retain their plain-text form, the plain texts
    /// are joined and markup derivation stays lazy. Otherwise both operands
    /// are forced into markup form and joined at the markup level.
    pub fn concat(&self, other: &MarkupValue) -> OutputResult<MarkupValue> {
        if self.format.as_ref() != other.format.as_ref() {
            return Err(OutputError::FormatMismatch {
                left: self.format.name().to_string(),
                right: other.format.name().to_string(),
            });
        }
        match (&self.plain, &other.plain) {
            (Some(a), Some(b)) => Ok(MarkupValue::from_plain(
                self.format.clone(),
                format!("{a}{b}"),
            )),
            _ => Ok(MarkupValue::from_markup(
                self.format.clone(),
                format!("{}{}", self.markup(), other.markup()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{HTML, XML};
    use pretty_assertions::assert_eq;

    fn html() -> Arc<dyn MarkupFormat> {
        HTML.clone()
    }

    #[test]
    fn test_plain_escapes_lazily_and_memoizes() {
        let v = MarkupValue::from_plain(html(), "a & b");
        assert_eq!(v.plain(), Some("a & b"));
        assert_eq!(v.markup(), "a &amp; b");
        // Second access returns the memoized string.
        assert_eq!(v.markup(), "a &amp; b");
    }

    #[test]
    fn test_markup_passthrough() {
        let v = MarkupValue::from_markup(html(), "<b>hi</b>");
        assert_eq!(v.plain(), None);
        assert_eq!(v.markup(), "<b>hi</b>");
    }

    #[test]
    fn test_concat_plain_plain_stays_plain() {
        let a = MarkupValue::from_plain(html(), "a & ");
        let b = MarkupValue::from_plain(html(), "b");
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.plain(), Some("a & b"));
        assert_eq!(joined.markup(), "a &amp; b");
    }

    #[test]
    fn test_concat_forces_markup_when_one_side_is_markup() {
        let a = MarkupValue::from_plain(html(), "1 < 2, ");
        let b = MarkupValue::from_markup(html(), "<i>right</i>");
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.plain(), None);
        assert_eq!(joined.markup(), "1 &lt; 2, <i>right</i>");
    }

    #[test]
    fn test_concat_rejects_format_mismatch() {
        let a = MarkupValue::from_plain(html(), "x");
        let b = MarkupValue::from_plain(XML.clone(), "y");
        let err = a.concat(&b).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't concatenate markup of format HTML with markup of format XML"
        );
    }

    #[test]
    fn test_is_empty_does_not_force_escaping() {
        let v = MarkupValue::from_plain(html(), "");
        assert!(v.is_empty());
        // markup never forced
        assert!(v.markup.get().is_none());
        let w = MarkupValue::from_markup(html(), "x");
        assert!(!w.is_empty());
    }
}

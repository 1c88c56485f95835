/*
 * formats.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! End-to-end tests for the formatter factories.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use templar_arith::Number;
use templar_format::{
    AliasNumberFormatFactory, CustomNumberFormatFactory, FormatResult, Locale, NumberFormat,
    NumberFormatFactory,
};

#[test]
fn test_localized_grouping() {
    let factory = NumberFormatFactory::new();
    let mut en = factory.get("#,##0.00", &Locale::parse("en_US")).unwrap();
    let mut de = factory.get("#,##0.00", &Locale::parse("de_DE")).unwrap();
    let value = Number::Double(1234567.891);
    assert_eq!(en.format(&value).unwrap(), "1,234,567.89");
    assert_eq!(de.format(&value).unwrap(), "1.234.567,89");
}

#[test]
fn test_fallback_format_covers_non_decimal_values() {
    let factory = NumberFormatFactory::new();
    // INF has no decimal expansion but the canonical literal is always
    // available, so the primary succeeds on it too.
    let mut format = factory.get("0.00|0", &Locale::default()).unwrap();
    assert_eq!(format.format(&Number::Double(1.5)).unwrap(), "1.50");
    assert_eq!(format.format(&Number::Double(f64::INFINITY)).unwrap(), "INF");
}

/// A deliberately stateful format: prefixes each output with a running
/// sequence number.
#[derive(Debug)]
struct SequencedFormat {
    seen: usize,
    inner: Box<dyn NumberFormat>,
}

impl NumberFormat for SequencedFormat {
    fn format(&mut self, value: &Number) -> FormatResult<String> {
        self.seen += 1;
        Ok(format!("{}:{}", self.seen, self.inner.format(value)?))
    }

    fn parse(&self, _text: &str) -> Option<Number> {
        None
    }
}

struct SequencedFactory;

impl CustomNumberFormatFactory for SequencedFactory {
    fn get(
        &self,
        params: &str,
        locale: &Locale,
        factory: &NumberFormatFactory,
    ) -> FormatResult<Box<dyn NumberFormat>> {
        Ok(Box::new(SequencedFormat {
            seen: 0,
            inner: factory.get(params, locale)?,
        }))
    }
}

#[test]
fn test_each_get_returns_an_independent_instance() {
    let factory = NumberFormatFactory::new();
    factory.register_custom("seq", Arc::new(SequencedFactory));

    let locale = Locale::default();
    let mut a = factory.get("@seq 0", &locale).unwrap();
    let mut b = factory.get("@seq 0", &locale).unwrap();

    assert_eq!(a.format(&Number::Int(7)).unwrap(), "1:7");
    assert_eq!(a.format(&Number::Int(7)).unwrap(), "2:7");
    // b's counter is untouched by a's use.
    assert_eq!(b.format(&Number::Int(7)).unwrap(), "1:7");
}

#[test]
fn test_alias_resolves_through_the_factory_per_locale() {
    let factory = NumberFormatFactory::new();
    factory.register_custom(
        "weight",
        Arc::new(
            AliasNumberFormatFactory::new("0.# kg")
                .with_locale(Locale::parse("en_US"), "0.# lbs"),
        ),
    );

    let mut us = factory.get("@weight", &Locale::parse("en_US")).unwrap();
    let mut gb = factory.get("@weight", &Locale::parse("en_GB")).unwrap();
    assert_eq!(us.format(&Number::Double(70.5)).unwrap(), "70.5 lbs");
    assert_eq!(gb.format(&Number::Double(70.5)).unwrap(), "70.5 kg");
}

#[test]
fn test_cache_flushes_past_its_bound() {
    let factory = NumberFormatFactory::new();
    let locale = Locale::default();
    // Fill the cache right up to its bound with distinct patterns.
    for width in 1..=1024 {
        let pattern = "0".repeat(width);
        factory.get(&pattern, &locale).unwrap();
    }
    assert_eq!(factory.cached_count(), 1024);
    // The next distinct pattern triggers the wholesale flush; only it
    // remains cached afterwards.
    factory.get("#.#", &locale).unwrap();
    assert_eq!(factory.cached_count(), 1);
}

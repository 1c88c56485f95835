/*
 * factory.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Cache-aware formatter factories.
//!
//! A factory maps a format parameter string plus a locale (and, for dates, a
//! time zone and subtype) to a formatter. Compiled formatters are cached
//! process-wide; the cache stores an immutable prototype and every `get`
//! hands out a fresh clone, because formatter instances may carry per-use
//! state.
//!
//! The parameter string is a small mini-language:
//!
//! - `@name` or `@name params` or `@name_params` selects a registered custom
//!   format; unknown names fail with an "undefined custom format" error.
//! - `primary|fallback` tries the primary pattern first, then the fallback.
//! - A literal leading `@` in a real pattern is escaped by doubling (`@@`).
//!
//! Cache growth is bounded: past the limit the whole cache is flushed and a
//! single warning is logged. Unbounded growth normally means a template is
//! generating one-off format strings dynamically.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::FixedOffset;
use parking_lot::RwLock;

use crate::date::{DateFormat, DateKind, IsoLikeDateFormat, PatternDateFormat};
use crate::error::{FormatError, FormatResult};
use crate::locale::Locale;
use crate::number::{DecimalFormat, FallbackNumberFormat, NumberFormat};

/// Maximum number of cached formatter prototypes before the leak-prevention
/// flush kicks in.
const MAX_CACHE_SIZE: usize = 1024;

/// How a format parameter string was classified.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedParam<'a> {
    /// `@name`-style reference to a registered custom format.
    Custom { name: &'a str, params: &'a str },
    /// A plain pattern (with any leading `@@` already unescaped).
    Pattern(String),
}

/// Classify a format parameter string.
pub fn parse_param(raw: &str) -> FormatResult<ParsedParam<'_>> {
    if let Some(unescaped) = raw.strip_prefix("@@") {
        return Ok(ParsedParam::Pattern(format!("@{unescaped}")));
    }
    let Some(body) = raw.strip_prefix('@') else {
        return Ok(ParsedParam::Pattern(raw.to_string()));
    };
    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    if name_len == 0 {
        return Err(FormatError::MalformedParameter {
            param: raw.to_string(),
        });
    }
    let (name, rest) = body.split_at(name_len);
    // `@base 2` and the inline `@base_2` variant both carry "2" as params.
    let params = match rest.chars().next() {
        Some(' ') | Some('_') => &rest[1..],
        None => "",
        Some(_) => {
            return Err(FormatError::MalformedParameter {
                param: raw.to_string(),
            })
        }
    };
    Ok(ParsedParam::Custom { name, params })
}

/// Factory callback for `@name` number formats.
pub trait CustomNumberFormatFactory: Send + Sync {
    /// Build a formatter for `params` in `locale`. The enclosing factory is
    /// passed in so aliases can resolve their target through it.
    fn get(
        &self,
        params: &str,
        locale: &Locale,
        factory: &NumberFormatFactory,
    ) -> FormatResult<Box<dyn NumberFormat>>;
}

/// Factory callback for `@name` date formats.
pub trait CustomDateFormatFactory: Send + Sync {
    fn get(
        &self,
        params: &str,
        locale: &Locale,
        tz: FixedOffset,
        kind: DateKind,
        factory: &DateFormatFactory,
    ) -> FormatResult<Box<dyn DateFormat>>;
}

/// Pluggable, cache-aware factory for number formats.
pub struct NumberFormatFactory {
    cache: RwLock<HashMap<(String, Locale), Arc<DecimalFormat>>>,
    customs: RwLock<HashMap<String, Arc<dyn CustomNumberFormatFactory>>>,
}

impl Default for NumberFormatFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberFormatFactory {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            customs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a named custom format factory, replacing any previous one
    /// under the same name.
    pub fn register_custom(
        &self,
        name: impl Into<String>,
        factory: Arc<dyn CustomNumberFormatFactory>,
    ) {
        self.customs.write().insert(name.into(), factory);
    }

    /// Resolve a format parameter string to a formatter.
    pub fn get(&self, params: &str, locale: &Locale) -> FormatResult<Box<dyn NumberFormat>> {
        match parse_param(params)? {
            ParsedParam::Custom { name, params } => {
                let custom = self.customs.read().get(name).cloned();
                match custom {
                    Some(factory) => factory.get(params, locale, self),
                    None => Err(FormatError::UndefinedCustomFormat {
                        name: name.to_string(),
                    }),
                }
            }
            ParsedParam::Pattern(pattern) => match pattern.split_once('|') {
                Some((primary, fallback)) => Ok(Box::new(FallbackNumberFormat::new(
                    self.get_pattern(primary, locale)?,
                    self.get_pattern(fallback, locale)?,
                ))),
                None => self.get_pattern(&pattern, locale),
            },
        }
    }

    fn get_pattern(&self, pattern: &str, locale: &Locale) -> FormatResult<Box<dyn NumberFormat>> {
        let key = (pattern.to_string(), locale.clone());
        if let Some(prototype) = self.cache.read().get(&key) {
            return Ok(Box::new(prototype.as_ref().clone()));
        }
        let compiled = Arc::new(DecimalFormat::compile(pattern, locale)?);
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHE_SIZE {
            // Self-healing flush; this normally means a template is building
            // one-off format strings at render time.
            tracing::warn!(
                size = cache.len(),
                "Number format cache exceeded its bound; flushing it entirely"
            );
            cache.clear();
        }
        let prototype = cache.entry(key).or_insert_with(|| compiled).clone();
        Ok(Box::new(prototype.as_ref().clone()))
    }

    /// Drop every cached prototype. The only mutation entry point besides
    /// lazy population.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of cached prototypes (for tests and diagnostics).
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

/// Cache key for date formats: subtype and zone both affect the output.
type DateKey = (String, Locale, i32, DateKind);

/// The compiled prototype behind a date cache entry.
#[derive(Debug, Clone)]
enum DatePrototype {
    Pattern(PatternDateFormat),
    IsoLike(IsoLikeDateFormat),
}

/// Pluggable, cache-aware factory for date formats.
pub struct DateFormatFactory {
    cache: RwLock<HashMap<DateKey, Arc<DatePrototype>>>,
    customs: RwLock<HashMap<String, Arc<dyn CustomDateFormatFactory>>>,
}

impl Default for DateFormatFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DateFormatFactory {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            customs: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_custom(
        &self,
        name: impl Into<String>,
        factory: Arc<dyn CustomDateFormatFactory>,
    ) {
        self.customs.write().insert(name.into(), factory);
    }

    /// Resolve a date format parameter string.
    ///
    /// `iso` and `xs` are built-in families; `iso date`, `iso time`,
    /// `iso datetime` (and the `xs` equivalents) force a subtype. Anything
    /// else is treated as a chrono `%`-pattern.
    pub fn get(
        &self,
        params: &str,
        locale: &Locale,
        tz: FixedOffset,
        kind: DateKind,
    ) -> FormatResult<Box<dyn DateFormat>> {
        match parse_param(params)? {
            ParsedParam::Custom { name, params } => {
                let custom = self.customs.read().get(name).cloned();
                match custom {
                    Some(factory) => factory.get(params, locale, tz, kind, self),
                    None => Err(FormatError::UndefinedCustomFormat {
                        name: name.to_string(),
                    }),
                }
            }
            ParsedParam::Pattern(pattern) => self.get_pattern(&pattern, locale, tz, kind),
        }
    }

    fn get_pattern(
        &self,
        pattern: &str,
        locale: &Locale,
        tz: FixedOffset,
        kind: DateKind,
    ) -> FormatResult<Box<dyn DateFormat>> {
        let key = (
            pattern.to_string(),
            locale.clone(),
            tz.local_minus_utc(),
            kind,
        );
        if let Some(prototype) = self.cache.read().get(&key) {
            return Ok(materialize(prototype));
        }
        let compiled = Arc::new(compile_date(pattern, tz)?);
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHE_SIZE {
            tracing::warn!(
                size = cache.len(),
                "Date format cache exceeded its bound; flushing it entirely"
            );
            cache.clear();
        }
        let prototype = cache.entry(key).or_insert_with(|| compiled).clone();
        Ok(materialize(&prototype))
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

fn materialize(prototype: &Arc<DatePrototype>) -> Box<dyn DateFormat> {
    match prototype.as_ref() {
        DatePrototype::Pattern(p) => Box::new(p.clone()),
        DatePrototype::IsoLike(p) => Box::new(p.clone()),
    }
}

fn compile_date(pattern: &str, tz: FixedOffset) -> FormatResult<DatePrototype> {
    let (family, rest) = match pattern.split_once(' ') {
        Some((family, rest)) => (family, Some(rest)),
        None => (pattern, None),
    };
    let xs_flavor = match family {
        "iso" => Some(false),
        "xs" => Some(true),
        _ => None,
    };
    if let Some(xs_flavor) = xs_flavor {
        let forced = match rest {
            None => None,
            Some("date") => Some(DateKind::DateOnly),
            Some("time") => Some(DateKind::TimeOnly),
            Some("datetime") => Some(DateKind::DateTime),
            Some(other) => {
                return Err(FormatError::MalformedParameter {
                    param: other.to_string(),
                })
            }
        };
        return Ok(DatePrototype::IsoLike(IsoLikeDateFormat::new(
            family, xs_flavor, forced, tz,
        )));
    }
    Ok(DatePrototype::Pattern(PatternDateFormat::compile(
        pattern, tz,
    )?))
}

/// A named format defined as a pure alias to another format string,
/// optionally locale-dependent.
///
/// Lookup walks the locale fallback chain from most specific to least
/// specific before taking the locale-independent default, so applications
/// can expose semantic names ("price", "weight") instead of raw patterns.
pub struct AliasNumberFormatFactory {
    default_target: String,
    localized_targets: HashMap<Locale, String>,
}

impl AliasNumberFormatFactory {
    pub fn new(default_target: impl Into<String>) -> Self {
        Self {
            default_target: default_target.into(),
            localized_targets: HashMap::new(),
        }
    }

    pub fn with_locale(mut self, locale: Locale, target: impl Into<String>) -> Self {
        self.localized_targets.insert(locale, target.into());
        self
    }

    fn target_for(&self, locale: &Locale) -> &str {
        for candidate in locale.fallback_chain() {
            if let Some(target) = self.localized_targets.get(&candidate) {
                return target;
            }
        }
        &self.default_target
    }
}

impl CustomNumberFormatFactory for AliasNumberFormatFactory {
    fn get(
        &self,
        _params: &str,
        locale: &Locale,
        factory: &NumberFormatFactory,
    ) -> FormatResult<Box<dyn NumberFormat>> {
        factory.get(self.target_for(locale), locale)
    }
}

/*
 * locale.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Locale identifiers and fallback chains.
//!
//! A locale has the `language[_COUNTRY[_VARIANT]]` shape. Lookups that are
//! locale-sensitive (alias targets, separator tables) walk the fallback
//! chain from most specific to least specific: `en_GB_Win` falls back to
//! `en_GB`, then `en`, then the caller's default.

use std::fmt;

/// A locale identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Locale {
    /// Build a locale from its parts.
    pub fn new(
        language: impl Into<String>,
        country: Option<&str>,
        variant: Option<&str>,
    ) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
            country: country.map(|c| c.to_ascii_uppercase()),
            variant: variant.map(|v| v.to_string()),
        }
    }

    /// Parse a `language[_COUNTRY[_VARIANT]]` identifier.
    pub fn parse(id: &str) -> Self {
        let mut parts = id.splitn(3, '_');
        let language = parts.next().unwrap_or_default();
        let country = parts.next();
        let variant = parts.next();
        Locale::new(language, country, variant)
    }

    /// The language subtag, lowercase.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The country subtag, uppercase, if present.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The variant subtag, if present.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// The fallback chain for this locale, starting with the locale itself
    /// and dropping the least significant subtag at each step.
    ///
    /// `en_GB_Win` yields `[en_GB_Win, en_GB, en]`. The caller appends its
    /// own default at the end of the chain.
    pub fn fallback_chain(&self) -> Vec<Locale> {
        let mut chain = vec![self.clone()];
        if self.variant.is_some() {
            chain.push(Locale {
                language: self.language.clone(),
                country: self.country.clone(),
                variant: None,
            });
        }
        if self.country.is_some() {
            chain.push(Locale {
                language: self.language.clone(),
                country: None,
                variant: None,
            });
        }
        chain
    }

    /// Decimal separator for this locale.
    pub fn decimal_separator(&self) -> char {
        match self.language.as_str() {
            "de" | "es" | "fr" | "it" | "nl" | "pt" | "ru" => ',',
            _ => '.',
        }
    }

    /// Grouping separator for this locale.
    pub fn grouping_separator(&self) -> char {
        match self.language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" => '.',
            // Narrow no-break space per CLDR; plain NBSP kept for simplicity
            "fr" | "ru" => '\u{a0}',
            _ => ',',
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en", Some("US"), None)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language)?;
        if let Some(country) = &self.country {
            write!(f, "_{country}")?;
        }
        if let Some(variant) = &self.variant {
            write!(f, "_{variant}")?;
        }
        Ok(())
    }
}

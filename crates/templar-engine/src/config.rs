/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration and per-template configuration overrides.
//!
//! [`Configuration`] is built once and then shared, effectively immutable,
//! across concurrently rendering threads. Per-template overrides are
//! [`TemplateConfig`] fragments selected by a matcher chain evaluated in
//! declared order.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use glob::{MatchOptions, Pattern};
use indexmap::IndexMap;
use templar_arith::{ArithmeticEngine, ConservativeEngine};
use templar_format::{utc, DateFormatFactory, Locale, NumberFormatFactory};
use templar_model::Model;
use templar_output::{MarkupFormat, PLAIN_TEXT};

use crate::error::{EngineError, EngineResult};

/// A partial configuration: only the set fields override the defaults.
#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    pub encoding: Option<String>,
    pub output_format: Option<Arc<dyn MarkupFormat>>,
    pub locale: Option<Locale>,
    pub number_format: Option<String>,
    pub date_format: Option<String>,
    pub update_delay: Option<Duration>,
}

impl TemplateConfig {
    /// Overlay `other` on top of this fragment; fields set in `other` win.
    pub fn overlay(&mut self, other: &TemplateConfig) {
        if other.encoding.is_some() {
            self.encoding = other.encoding.clone();
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format.clone();
        }
        if other.locale.is_some() {
            self.locale = other.locale.clone();
        }
        if other.number_format.is_some() {
            self.number_format = other.number_format.clone();
        }
        if other.date_format.is_some() {
            self.date_format = other.date_format.clone();
        }
        if other.update_delay.is_some() {
            self.update_delay = other.update_delay;
        }
    }
}

/// Selects templates by name.
#[derive(Debug, Clone)]
pub enum ConfigMatcher {
    /// Glob over the whole root-based name; `*` does not cross `/`.
    PathGlob(Pattern),
    /// Glob over the final name segment only.
    NameGlob(Pattern),
    /// Extension equality, without the dot.
    Extension(String),
    Or(Vec<ConfigMatcher>),
    And(Vec<ConfigMatcher>),
}

impl ConfigMatcher {
    pub fn path_glob(pattern: &str) -> EngineResult<Self> {
        Ok(ConfigMatcher::PathGlob(compile_glob(pattern)?))
    }

    pub fn name_glob(pattern: &str) -> EngineResult<Self> {
        Ok(ConfigMatcher::NameGlob(compile_glob(pattern)?))
    }

    pub fn extension(extension: impl Into<String>) -> Self {
        ConfigMatcher::Extension(extension.into())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            ConfigMatcher::PathGlob(pattern) => {
                let options = MatchOptions {
                    require_literal_separator: true,
                    ..MatchOptions::default()
                };
                pattern.matches_with(name, options)
            }
            ConfigMatcher::NameGlob(pattern) => {
                let segment = name.rsplit('/').next().unwrap_or(name);
                pattern.matches(segment)
            }
            ConfigMatcher::Extension(extension) => {
                let segment = name.rsplit('/').next().unwrap_or(name);
                segment
                    .rsplit_once('.')
                    .is_some_and(|(_, e)| e == extension)
            }
            ConfigMatcher::Or(matchers) => matchers.iter().any(|m| m.matches(name)),
            ConfigMatcher::And(matchers) => matchers.iter().all(|m| m.matches(name)),
        }
    }
}

fn compile_glob(pattern: &str) -> EngineResult<Pattern> {
    // Eager validation; the error echoes the offending pattern.
    Pattern::new(pattern).map_err(|_| EngineError::MalformedName {
        name: pattern.to_string(),
    })
}

/// Whether the first matching rule wins or all matching rules merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    #[default]
    FirstMatch,
    /// All matches overlay in declared order; later rules override.
    MergeAll,
}

/// What a chain does when nothing matches. Silently falling back is
/// sometimes exactly wrong (a required per-template classification), so
/// this is explicit per chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnNoMatch {
    #[default]
    UseDefaults,
    Error,
}

/// An ordered chain of matcher/fragment rules.
#[derive(Debug, Clone, Default)]
pub struct ConfigChain {
    rules: Vec<(ConfigMatcher, TemplateConfig)>,
    pub strategy: MatchStrategy,
    pub on_no_match: OnNoMatch,
}

impl ConfigChain {
    pub fn new(strategy: MatchStrategy, on_no_match: OnNoMatch) -> Self {
        Self {
            rules: Vec::new(),
            strategy,
            on_no_match,
        }
    }

    pub fn rule(mut self, matcher: ConfigMatcher, config: TemplateConfig) -> Self {
        self.rules.push((matcher, config));
        self
    }

    /// The effective fragment for `name`, or `None` for plain defaults.
    pub fn configure(&self, name: &str) -> EngineResult<Option<TemplateConfig>> {
        let mut merged: Option<TemplateConfig> = None;
        for (matcher, config) in &self.rules {
            if !matcher.matches(name) {
                continue;
            }
            match self.strategy {
                MatchStrategy::FirstMatch => return Ok(Some(config.clone())),
                MatchStrategy::MergeAll => {
                    merged.get_or_insert_with(TemplateConfig::default).overlay(config);
                }
            }
        }
        if merged.is_none() && self.on_no_match == OnNoMatch::Error {
            return Err(EngineError::NoConfigMatch {
                name: name.to_string(),
            });
        }
        Ok(merged)
    }
}

/// Reporter invoked for each error caught by an attempt/recover block.
pub type AttemptReporter = Arc<dyn Fn(&EngineError) + Send + Sync>;

/// The engine-wide configuration. Build it once, share it.
pub struct Configuration {
    pub shared_vars: IndexMap<String, Model>,
    pub arithmetic: Arc<dyn ArithmeticEngine>,
    pub output_format: Arc<dyn MarkupFormat>,
    pub locale: Locale,
    pub time_zone: FixedOffset,
    pub number_format: String,
    pub date_format: String,
    pub update_delay: Duration,
    pub attempt_reporter: AttemptReporter,
    pub config_chain: Option<ConfigChain>,
    number_factory: NumberFormatFactory,
    date_factory: DateFormatFactory,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            shared_vars: IndexMap::new(),
            arithmetic: Arc::new(ConservativeEngine),
            output_format: PLAIN_TEXT.clone(),
            locale: Locale::default(),
            time_zone: utc(),
            number_format: "0.######".to_string(),
            date_format: "iso".to_string(),
            update_delay: Duration::from_secs(5),
            attempt_reporter: Arc::new(|error| {
                tracing::warn!(%error, "Error recovered by attempt block");
            }),
            config_chain: None,
            number_factory: NumberFormatFactory::new(),
            date_factory: DateFormatFactory::new(),
        }
    }

    pub fn with_arithmetic(mut self, engine: Arc<dyn ArithmeticEngine>) -> Self {
        self.arithmetic = engine;
        self
    }

    pub fn with_output_format(mut self, format: Arc<dyn MarkupFormat>) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = format.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    pub fn with_attempt_reporter(mut self, reporter: AttemptReporter) -> Self {
        self.attempt_reporter = reporter;
        self
    }

    pub fn with_config_chain(mut self, chain: ConfigChain) -> Self {
        self.config_chain = Some(chain);
        self
    }

    pub fn with_shared_var(mut self, name: impl Into<String>, value: Model) -> Self {
        self.shared_vars.insert(name.into(), value);
        self
    }

    pub fn number_factory(&self) -> &NumberFormatFactory {
        &self.number_factory
    }

    pub fn date_factory(&self) -> &DateFormatFactory {
        &self.date_factory
    }

    /// The per-template fragment for `name`, from the configured chain.
    pub fn template_config(&self, name: &str) -> EngineResult<TemplateConfig> {
        match &self.config_chain {
            Some(chain) => Ok(chain.configure(name)?.unwrap_or_default()),
            None => Ok(TemplateConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoding(value: &str) -> TemplateConfig {
        TemplateConfig {
            encoding: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_path_glob_does_not_cross_separators() {
        let matcher = ConfigMatcher::path_glob("mail/*.ftl").unwrap();
        assert!(matcher.matches("mail/order.ftl"));
        assert!(!matcher.matches("mail/drafts/order.ftl"));
    }

    #[test]
    fn test_name_glob_and_extension() {
        let name = ConfigMatcher::name_glob("order*").unwrap();
        assert!(name.matches("mail/order_en.ftl"));
        assert!(!name.matches("mail/invoice.ftl"));

        let ext = ConfigMatcher::extension("ftlh");
        assert!(ext.matches("web/index.ftlh"));
        assert!(!ext.matches("web/index.ftl"));
    }

    #[test]
    fn test_combinators() {
        let both = ConfigMatcher::And(vec![
            ConfigMatcher::path_glob("mail/*").unwrap(),
            ConfigMatcher::extension("ftl"),
        ]);
        assert!(both.matches("mail/order.ftl"));
        assert!(!both.matches("web/order.ftl"));

        let either = ConfigMatcher::Or(vec![
            ConfigMatcher::extension("ftlh"),
            ConfigMatcher::extension("ftlx"),
        ]);
        assert!(either.matches("a.ftlx"));
        assert!(!either.matches("a.ftl"));
    }

    #[test]
    fn test_first_match_wins() {
        let chain = ConfigChain::new(MatchStrategy::FirstMatch, OnNoMatch::UseDefaults)
            .rule(ConfigMatcher::extension("ftl"), encoding("UTF-8"))
            .rule(ConfigMatcher::path_glob("mail/*.ftl").unwrap(), encoding("latin-1"));
        let config = chain.configure("mail/order.ftl").unwrap().unwrap();
        assert_eq!(config.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_merge_all_lets_later_rules_override() {
        let mail = TemplateConfig {
            encoding: Some("latin-1".to_string()),
            number_format: Some("0.00".to_string()),
            ..Default::default()
        };
        let chain = ConfigChain::new(MatchStrategy::MergeAll, OnNoMatch::UseDefaults)
            .rule(ConfigMatcher::extension("ftl"), encoding("UTF-8"))
            .rule(ConfigMatcher::path_glob("mail/*.ftl").unwrap(), mail);
        let config = chain.configure("mail/order.ftl").unwrap().unwrap();
        assert_eq!(config.encoding.as_deref(), Some("latin-1"));
        assert_eq!(config.number_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_no_match_toggle() {
        let lenient = ConfigChain::new(MatchStrategy::FirstMatch, OnNoMatch::UseDefaults)
            .rule(ConfigMatcher::extension("ftlh"), encoding("UTF-8"));
        assert!(lenient.configure("a.txt").unwrap().is_none());

        let strict = ConfigChain::new(MatchStrategy::FirstMatch, OnNoMatch::Error)
            .rule(ConfigMatcher::extension("ftlh"), encoding("UTF-8"));
        let err = strict.configure("a.txt").unwrap_err();
        assert!(matches!(err, EngineError::NoConfigMatch { .. }));
    }
}

/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template cache behavior against a controllable in-memory loader.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use templar_engine::{
    ConfigChain, ConfigMatcher, Configuration, EngineError, LookupOutcome, MatchStrategy,
    MemoryLoader, OnNoMatch, TemplateCache, TemplateConfig,
};
use templar_format::Locale;
use templar_model::{ClassRegistry, Model, ObjectWrapper};

fn render(template: &Arc<templar_engine::Template>, config: &Configuration) -> String {
    let wrapper = ObjectWrapper::new(Arc::new(ClassRegistry::new()));
    let data: Model = wrapper.wrap_json(&serde_json::json!({"n": 1}));
    let mut out = String::new();
    template.process(config, &data, &mut out).unwrap();
    out
}

fn get(
    cache: &TemplateCache,
    config: &Configuration,
    name: &str,
    locale: Option<&Locale>,
) -> LookupOutcome {
    cache.get_template(config, name, locale, None, None).unwrap()
}

#[test]
fn test_within_update_delay_the_cached_template_is_served() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("a.ftl", "v1");
    let cache = TemplateCache::new(loader.clone());
    let config = Configuration::new().with_update_delay(Duration::from_secs(3600));

    let first = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert_eq!(render(&first, &config), "v1");

    // The source changes, but the delay has not elapsed: still v1.
    loader.put("a.ftl", "v2");
    let second = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_past_update_delay_a_version_change_triggers_reload() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("a.ftl", "v1");
    let cache = TemplateCache::new(loader.clone());
    let config = Configuration::new().with_update_delay(Duration::ZERO);

    let first = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert_eq!(render(&first, &config), "v1");

    loader.put("a.ftl", "v2");
    let second = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert_eq!(render(&second, &config), "v2");

    // Unchanged token: the cached instance is reused, not reparsed.
    let third = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert!(Arc::ptr_eq(&second, &third));
}

#[test]
fn test_locale_suffix_lookup_finds_the_most_specific_candidate() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("mail/order.ftl", "default");
    loader.put("mail/order_en.ftl", "english");
    let cache = TemplateCache::new(loader);
    let config = Configuration::new();

    let locale = Locale::parse("en_GB");
    let found = get(&cache, &config, "mail/order.ftl", Some(&locale))
        .found()
        .unwrap();
    assert_eq!(found.source_name(), "mail/order_en.ftl");
    assert_eq!(found.name(), "mail/order.ftl");

    let found = get(&cache, &config, "mail/order.ftl", None).found().unwrap();
    assert_eq!(found.source_name(), "mail/order.ftl");
}

#[test]
fn test_missing_is_an_outcome_not_an_error() {
    let cache = TemplateCache::new(Arc::new(MemoryLoader::new()));
    let config = Configuration::new();
    let outcome = get(&cache, &config, "dir/../absent.ftl", None);
    let LookupOutcome::Missing {
        normalized_name,
        reason,
    } = outcome
    else {
        panic!("expected a missing outcome: {outcome:?}");
    };
    assert_eq!(normalized_name, "absent.ftl");
    assert!(reason.contains("absent.ftl"), "{reason}");
}

#[test]
fn test_malformed_and_escaping_names_are_errors() {
    let cache = TemplateCache::new(Arc::new(MemoryLoader::new()));
    let config = Configuration::new();
    let err = cache
        .get_template(&config, "../outside.ftl", None, None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::BackedOutOfRoot { .. }));

    let err = cache
        .get_template(&config, "scheme:x.ftl", None, None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::MalformedName { .. }));
}

#[test]
fn test_remove_and_clear_drop_entries() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("a.ftl", "v1");
    let cache = TemplateCache::new(loader.clone());
    let config = Configuration::new().with_update_delay(Duration::from_secs(3600));

    let first = get(&cache, &config, "a.ftl", None).found().unwrap();
    loader.put("a.ftl", "v2");

    // Removal forgets the entry even inside the update delay.
    assert!(cache.remove("a.ftl", None, None, None).unwrap());
    let second = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(render(&second, &config), "v2");

    loader.put("a.ftl", "v3");
    cache.clear();
    let third = get(&cache, &config, "a.ftl", None).found().unwrap();
    assert_eq!(render(&third, &config), "v3");
}

#[test]
fn test_config_chain_applies_per_template_overrides() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("mail/total.ftl", "${n}");
    loader.put("web/total.ftl", "${n}");
    let mail_format = TemplateConfig {
        number_format: Some("0.00".to_string()),
        ..Default::default()
    };
    let chain = ConfigChain::new(MatchStrategy::FirstMatch, OnNoMatch::UseDefaults)
        .rule(ConfigMatcher::path_glob("mail/*.ftl").unwrap(), mail_format);
    let config = Configuration::new().with_config_chain(chain);
    let cache = TemplateCache::new(loader);

    let mail = get(&cache, &config, "mail/total.ftl", None).found().unwrap();
    assert_eq!(render(&mail, &config), "1.00");

    let web = get(&cache, &config, "web/total.ftl", None).found().unwrap();
    assert_eq!(render(&web, &config), "1");
}

#[test]
fn test_required_classification_chain_errors_on_no_match() {
    let loader = Arc::new(MemoryLoader::new());
    loader.put("stray.ftl", "x");
    let chain = ConfigChain::new(MatchStrategy::FirstMatch, OnNoMatch::Error).rule(
        ConfigMatcher::path_glob("mail/*.ftl").unwrap(),
        TemplateConfig::default(),
    );
    let config = Configuration::new().with_config_chain(chain);
    let cache = TemplateCache::new(loader);

    let err = cache
        .get_template(&config, "stray.ftl", None, None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::NoConfigMatch { .. }));
}

/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template cache.
//!
//! Entries are keyed by normalized name, locale, custom lookup condition and
//! encoding. Each entry has its own lock; the cache-wide map lock is held
//! only long enough to fetch the entry slot, so a slow stale check for one
//! name never blocks lookups for other names.
//!
//! Within the configured update delay a cached template is served without
//! touching the loader, even if the backing source has changed. Past the
//! delay the version token is re-checked; a mismatch triggers a transparent
//! reload.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use templar_format::Locale;

use crate::config::Configuration;
use crate::error::EngineResult;
use crate::loader::{TemplateLoader, VersionToken};
use crate::lookup::{LocaleSuffixStrategy, TemplateLookupStrategy};
use crate::name;
use crate::template::Template;

/// Cache key: everything that can change which source is resolved or how it
/// is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TemplateKey {
    name: String,
    locale: Option<Locale>,
    condition: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug)]
struct Entry {
    template: Arc<Template>,
    version: VersionToken,
    last_checked: Instant,
}

type EntrySlot = Arc<Mutex<Option<Entry>>>;

/// Outcome of a template lookup. Ordinary "does not exist" is data, not an
/// error; errors are reserved for I/O and parse failures.
#[derive(Debug)]
pub enum LookupOutcome {
    Found(Arc<Template>),
    Missing {
        normalized_name: String,
        reason: String,
    },
}

impl LookupOutcome {
    pub fn found(self) -> Option<Arc<Template>> {
        match self {
            LookupOutcome::Found(template) => Some(template),
            LookupOutcome::Missing { .. } => None,
        }
    }
}

/// A concurrent template cache in front of a loader.
pub struct TemplateCache {
    loader: Arc<dyn TemplateLoader>,
    lookup: Arc<dyn TemplateLookupStrategy>,
    entries: Mutex<HashMap<TemplateKey, EntrySlot>>,
}

impl TemplateCache {
    pub fn new(loader: Arc<dyn TemplateLoader>) -> Self {
        Self {
            loader,
            lookup: Arc::new(LocaleSuffixStrategy),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn TemplateLookupStrategy>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Resolve `name` through the lookup strategy and loader, consulting and
    /// maintaining the cache.
    pub fn get_template(
        &self,
        config: &Configuration,
        name: &str,
        locale: Option<&Locale>,
        condition: Option<&str>,
        encoding: Option<&str>,
    ) -> EngineResult<LookupOutcome> {
        let normalized = name::normalize(None, name)?;
        let template_config = config.template_config(&normalized)?;
        let update_delay = template_config.update_delay.unwrap_or(config.update_delay);

        let slot = self.slot(TemplateKey {
            name: normalized.clone(),
            locale: locale.cloned(),
            condition: condition.map(str::to_string),
            encoding: encoding.map(str::to_string),
        });
        let mut entry = slot.lock();

        let cached = entry
            .as_ref()
            .map(|e| (e.template.clone(), e.version.clone(), e.last_checked));
        if let Some((template, version, last_checked)) = cached {
            if last_checked.elapsed() < update_delay {
                return Ok(LookupOutcome::Found(template));
            }
            // Stale check against the name the source was found under.
            match self.loader.find(template.source_name())? {
                Some(source) if source.version == version => {
                    if let Some(e) = entry.as_mut() {
                        e.last_checked = Instant::now();
                    }
                    return Ok(LookupOutcome::Found(template));
                }
                Some(source) => {
                    tracing::debug!(name = %normalized, "Template source changed; reloading");
                    let template = Arc::new(Template::parse(
                        normalized,
                        source.name,
                        &source.content,
                        template_config,
                    )?);
                    *entry = Some(Entry {
                        template: template.clone(),
                        version: source.version,
                        last_checked: Instant::now(),
                    });
                    return Ok(LookupOutcome::Found(template));
                }
                // The source vanished; fall through to a full probe.
                None => *entry = None,
            }
        }

        let candidates = self.lookup.candidates(&normalized, locale);
        for candidate in &candidates {
            let Some(source) = self.loader.find(candidate)? else {
                continue;
            };
            let template = Arc::new(Template::parse(
                normalized,
                source.name,
                &source.content,
                template_config,
            )?);
            *entry = Some(Entry {
                template: template.clone(),
                version: source.version,
                last_checked: Instant::now(),
            });
            return Ok(LookupOutcome::Found(template));
        }

        Ok(LookupOutcome::Missing {
            normalized_name: normalized,
            reason: format!(
                "no template found under any of the candidate names: {}",
                candidates.join(", ")
            ),
        })
    }

    fn slot(&self, key: TemplateKey) -> EntrySlot {
        self.entries.lock().entry(key).or_default().clone()
    }

    /// Drop one cached entry. Returns whether an entry existed.
    pub fn remove(
        &self,
        name: &str,
        locale: Option<&Locale>,
        condition: Option<&str>,
        encoding: Option<&str>,
    ) -> EngineResult<bool> {
        let key = TemplateKey {
            name: name::normalize(None, name)?,
            locale: locale.cloned(),
            condition: condition.map(str::to_string),
            encoding: encoding.map(str::to_string),
        };
        Ok(self.entries.lock().remove(&key).is_some())
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        tracing::debug!(size = entries.len(), "Clearing template cache");
        entries.clear();
    }
}

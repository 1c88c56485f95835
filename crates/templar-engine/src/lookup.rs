/*
 * lookup.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template lookup strategies.
//!
//! A strategy expands one requested name into the candidate names actually
//! probed against the loader, in probe order. The default appends locale
//! suffixes before the extension, most specific first.

use templar_format::Locale;

/// Expands a normalized template name into loader probe candidates.
pub trait TemplateLookupStrategy: Send + Sync {
    fn candidates(&self, name: &str, locale: Option<&Locale>) -> Vec<String>;
}

/// The default strategy: `name_en_GB.ext`, then `name_en.ext`, then
/// `name.ext`.
#[derive(Debug, Default)]
pub struct LocaleSuffixStrategy;

impl TemplateLookupStrategy for LocaleSuffixStrategy {
    fn candidates(&self, name: &str, locale: Option<&Locale>) -> Vec<String> {
        let Some(locale) = locale else {
            return vec![name.to_string()];
        };
        let (stem, extension) = split_extension(name);
        let mut candidates: Vec<String> = locale
            .fallback_chain()
            .iter()
            .map(|l| format!("{stem}_{l}{extension}"))
            .collect();
        candidates.push(name.to_string());
        candidates
    }
}

/// Split off the extension of the final path segment, dot included.
fn split_extension(name: &str) -> (&str, &str) {
    let last_segment_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[last_segment_start..].rfind('.') {
        Some(dot) => name.split_at(last_segment_start + dot),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locale_suffix_chain() {
        let strategy = LocaleSuffixStrategy;
        let locale = Locale::parse("en_GB");
        assert_eq!(
            strategy.candidates("mail/order.ftl", Some(&locale)),
            vec!["mail/order_en_GB.ftl", "mail/order_en.ftl", "mail/order.ftl"]
        );
    }

    #[test]
    fn test_no_locale_probes_the_name_directly() {
        let strategy = LocaleSuffixStrategy;
        assert_eq!(strategy.candidates("a.ftl", None), vec!["a.ftl"]);
    }

    #[test]
    fn test_extension_split_respects_directories() {
        // The dot in the directory name is not an extension.
        let strategy = LocaleSuffixStrategy;
        let locale = Locale::parse("de");
        assert_eq!(
            strategy.candidates("v1.2/readme", Some(&locale)),
            vec!["v1.2/readme_de", "v1.2/readme"]
        );
    }
}

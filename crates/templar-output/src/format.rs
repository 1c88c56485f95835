/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Concrete output formats.
//!
//! Each format declares how plain text is escaped into its markup, its MIME
//! type, and whether interpolations are auto-escaped by default. Escaping is
//! deliberately not idempotent over its own output: re-escaping markup is a
//! caller error this layer does not silently fix.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Escaping and concatenation semantics for one target output language.
pub trait MarkupFormat: fmt::Debug + Send + Sync {
    /// Short identifier, e.g. `"HTML"`. Formats compare equal by name.
    fn name(&self) -> &str;

    /// MIME type of the produced output.
    fn mime_type(&self) -> &str;

    /// Escape plain text into markup.
    fn escape(&self, plain: &str) -> String;

    /// Whether interpolated values are escaped by default in this format.
    fn auto_escaping_by_default(&self) -> bool;
}

impl PartialEq for dyn MarkupFormat {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

/// HTML output. Escapes `&`, `<`, `>`, `"` and `'`.
#[derive(Debug)]
pub struct HtmlFormat;

impl MarkupFormat for HtmlFormat {
    fn name(&self) -> &str {
        "HTML"
    }

    fn mime_type(&self) -> &str {
        "text/html"
    }

    fn escape(&self, plain: &str) -> String {
        escape_xml_like(plain, true)
    }

    fn auto_escaping_by_default(&self) -> bool {
        true
    }
}

/// XML output. Escapes the five predefined entities.
#[derive(Debug)]
pub struct XmlFormat;

impl MarkupFormat for XmlFormat {
    fn name(&self) -> &str {
        "XML"
    }

    fn mime_type(&self) -> &str {
        "application/xml"
    }

    fn escape(&self, plain: &str) -> String {
        escape_xml_like(plain, false)
    }

    fn auto_escaping_by_default(&self) -> bool {
        true
    }
}

/// RTF output. Escapes the control characters `\`, `{` and `}`.
#[derive(Debug)]
pub struct RtfFormat;

impl MarkupFormat for RtfFormat {
    fn name(&self) -> &str {
        "RTF"
    }

    fn mime_type(&self) -> &str {
        "application/rtf"
    }

    fn escape(&self, plain: &str) -> String {
        let mut out = String::with_capacity(plain.len());
        for c in plain.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '{' => out.push_str("\\{"),
                '}' => out.push_str("\\}"),
                _ => out.push(c),
            }
        }
        out
    }

    fn auto_escaping_by_default(&self) -> bool {
        true
    }
}

/// JSON-ish output. No character-level escaping is applied; templates
/// producing JSON are expected to emit well-formed fragments themselves.
#[derive(Debug)]
pub struct JsonFormat;

impl MarkupFormat for JsonFormat {
    fn name(&self) -> &str {
        "JSON"
    }

    fn mime_type(&self) -> &str {
        "application/json"
    }

    fn escape(&self, plain: &str) -> String {
        plain.to_string()
    }

    fn auto_escaping_by_default(&self) -> bool {
        false
    }
}

/// Plain text output: identity escaping, never auto-escapes.
#[derive(Debug)]
pub struct PlainTextFormat;

impl MarkupFormat for PlainTextFormat {
    fn name(&self) -> &str {
        "plainText"
    }

    fn mime_type(&self) -> &str {
        "text/plain"
    }

    fn escape(&self, plain: &str) -> String {
        plain.to_string()
    }

    fn auto_escaping_by_default(&self) -> bool {
        false
    }
}

/// Applies several formats in sequence (innermost first).
///
/// Unlike the concrete formats above this one is parameterized, so it is
/// constructed per use instead of being a singleton.
#[derive(Debug)]
pub struct CombinedFormat {
    name: String,
    mime_type: String,
    stages: Vec<Arc<dyn MarkupFormat>>,
}

impl CombinedFormat {
    /// Combine formats; escaping applies `stages` front to back, and the
    /// combined format reports the MIME type of the last stage.
    pub fn new(stages: Vec<Arc<dyn MarkupFormat>>) -> Self {
        let name = stages
            .iter()
            .map(|f| f.name().to_string())
            .collect::<Vec<_>>()
            .join("+");
        let mime_type = stages
            .last()
            .map(|f| f.mime_type().to_string())
            .unwrap_or_else(|| "text/plain".to_string());
        Self {
            name,
            mime_type,
            stages,
        }
    }
}

impl MarkupFormat for CombinedFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn escape(&self, plain: &str) -> String {
        let mut text = plain.to_string();
        for stage in &self.stages {
            text = stage.escape(&text);
        }
        text
    }

    fn auto_escaping_by_default(&self) -> bool {
        self.stages.iter().any(|f| f.auto_escaping_by_default())
    }
}

fn escape_xml_like(plain: &str, html_flavor: bool) -> String {
    let mut out = String::with_capacity(plain.len());
    for c in plain.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => {
                // &apos; is not defined in HTML 4
                out.push_str(if html_flavor { "&#39;" } else { "&apos;" });
            }
            _ => out.push(c),
        }
    }
    out
}

/// Shared HTML format instance.
pub static HTML: Lazy<Arc<HtmlFormat>> = Lazy::new(|| Arc::new(HtmlFormat));

/// Shared XML format instance.
pub static XML: Lazy<Arc<XmlFormat>> = Lazy::new(|| Arc::new(XmlFormat));

/// Shared RTF format instance.
pub static RTF: Lazy<Arc<RtfFormat>> = Lazy::new(|| Arc::new(RtfFormat));

/// Shared JSON format instance.
pub static JSON: Lazy<Arc<JsonFormat>> = Lazy::new(|| Arc::new(JsonFormat));

/// Shared plain text format instance.
pub static PLAIN_TEXT: Lazy<Arc<PlainTextFormat>> = Lazy::new(|| Arc::new(PlainTextFormat));

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_html_escaping() {
        assert_eq!(
            HtmlFormat.escape(r#"a < b & c > "d" 'e'"#),
            "a &lt; b &amp; c &gt; &quot;d&quot; &#39;e&#39;"
        );
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(XmlFormat.escape("'x'"), "&apos;x&apos;");
    }

    #[test]
    fn test_rtf_escaping() {
        assert_eq!(RtfFormat.escape(r"{\b bold}"), r"\{\\b bold\}");
    }

    #[test]
    fn test_escaping_not_idempotent() {
        // Escaping its own output escapes the ampersands again; callers must
        // not re-escape markup.
        let once = HtmlFormat.escape("&");
        let twice = HtmlFormat.escape(&once);
        assert_eq!(once, "&amp;");
        assert_eq!(twice, "&amp;amp;");
    }

    #[test]
    fn test_combined_format() {
        let combined = CombinedFormat::new(vec![HTML.clone() as Arc<dyn MarkupFormat>, RTF.clone()]);
        assert_eq!(combined.name(), "HTML+RTF");
        assert_eq!(combined.mime_type(), "application/rtf");
        // HTML first, then RTF over the result.
        assert_eq!(combined.escape("{<}"), r"\{&lt;\}");
        assert!(combined.auto_escaping_by_default());
    }

    #[test]
    fn test_plain_formats_do_not_escape() {
        assert_eq!(JsonFormat.escape("<&>"), "<&>");
        assert_eq!(PlainTextFormat.escape("<&>"), "<&>");
        assert!(!JsonFormat.auto_escaping_by_default());
    }
}

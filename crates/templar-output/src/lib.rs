/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Markup output formats and escaping semantics for the Templar engine.
//!
//! This crate represents the escaping/concatenation semantics of target
//! output languages (HTML, XML, RTF, JSON-ish, plain text). It defines how
//! plain text and pre-escaped markup combine without double-escaping.
//!
//! The concrete formats are singletons (see [`format::HTML`] and friends);
//! [`format::CombinedFormat`] is parameterized and built per use. A
//! [`MarkupValue`] is pre-escaped text bound to exactly one format; it keeps
//! its original plain text around so concatenation of two plain-backed
//! values can stay lazy.

pub mod error;
pub mod format;
pub mod markup;

pub use error::{OutputError, OutputResult};
pub use format::{
    CombinedFormat, HtmlFormat, JsonFormat, MarkupFormat, PlainTextFormat, RtfFormat, XmlFormat,
    HTML, JSON, PLAIN_TEXT, RTF, XML,
};
pub use markup::MarkupValue;

/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template resolution, caching, configuration and evaluation.
//!
//! The pieces compose as follows: a [`TemplateLoader`] maps names to
//! sources, a [`TemplateCache`] sits in front of it with version-token
//! staleness checks, a [`Configuration`] carries engine-wide defaults and
//! per-template override chains, and a parsed [`Template`] renders against
//! a data model with [`Template::process`].

pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
mod eval;
pub mod loader;
pub mod lookup;
pub mod name;
pub mod template;

pub use cache::{LookupOutcome, TemplateCache};
pub use config::{
    AttemptReporter, ConfigChain, ConfigMatcher, Configuration, MatchStrategy, OnNoMatch,
    TemplateConfig,
};
pub use error::{EngineError, EngineResult, LoadError};
pub use loader::{FileLoader, MemoryLoader, TemplateLoader, TemplateSource, VersionToken};
pub use lookup::{LocaleSuffixStrategy, TemplateLookupStrategy};
pub use name::normalize;
pub use template::Template;

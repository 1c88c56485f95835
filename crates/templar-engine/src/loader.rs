/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template loaders.
//!
//! A loader maps a normalized, root-based name to template source. "Does not
//! exist" is routine control flow here (lookup strategies probe several
//! candidate names per request), so it is `Ok(None)`, never an error.
//! Errors are reserved for genuine I/O failure.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use parking_lot::Mutex;

use crate::error::LoadError;

/// Opaque change marker of a template source. Two tokens compare equal iff
/// the backing source has not changed between the observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// Source of one template, as handed out by a loader.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// The name the source was found under (a lookup strategy candidate).
    pub name: String,
    pub version: VersionToken,
    pub content: String,
}

/// Maps normalized template names to sources.
pub trait TemplateLoader: Send + Sync {
    /// Find the source for `name`. `None` means the name does not exist
    /// with this loader.
    fn find(&self, name: &str) -> Result<Option<TemplateSource>, LoadError>;
}

/// Loads templates from a directory tree. Names are root-based and already
/// normalized, so they cannot address anything outside the root.
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateLoader for FileLoader {
    fn find(&self, name: &str) -> Result<Option<TemplateSource>, LoadError> {
        let path = self.root.join(name);
        let io_error = |source: io::Error| LoadError::Io {
            name: name.to_string(),
            source: Arc::new(source),
        };
        let metadata = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        let content = fs::read_to_string(&path).map_err(io_error)?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Ok(Some(TemplateSource {
            name: name.to_string(),
            version: VersionToken::new(format!("{}:{}", metadata.len(), modified)),
            content,
        }))
    }
}

/// In-memory loader for bundled templates and tests. Every update bumps the
/// entry's version token.
#[derive(Default)]
pub struct MemoryLoader {
    entries: Mutex<HashMap<String, (String, u64)>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a template, bumping its version.
    pub fn put(&self, name: impl Into<String>, content: impl Into<String>) {
        let mut entries = self.entries.lock();
        let name = name.into();
        let version = entries.get(&name).map(|(_, v)| v + 1).unwrap_or(0);
        entries.insert(name, (content.into(), version));
    }

    /// Bump an entry's version without changing its content, as an external
    /// touch would.
    pub fn touch(&self, name: &str) {
        if let Some((_, version)) = self.entries.lock().get_mut(name) {
            *version += 1;
        }
    }

    pub fn remove(&self, name: &str) {
        self.entries.lock().remove(name);
    }
}

impl TemplateLoader for MemoryLoader {
    fn find(&self, name: &str) -> Result<Option<TemplateSource>, LoadError> {
        Ok(self.entries.lock().get(name).map(|(content, version)| {
            TemplateSource {
                name: name.to_string(),
                version: VersionToken::new(version.to_string()),
                content: content.clone(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_loader_miss_is_none() {
        let loader = MemoryLoader::new();
        assert!(loader.find("absent.ftl").unwrap().is_none());
    }

    #[test]
    fn test_memory_loader_versions_change_on_update() {
        let loader = MemoryLoader::new();
        loader.put("a.ftl", "one");
        let first = loader.find("a.ftl").unwrap().unwrap().version;
        loader.put("a.ftl", "two");
        let second = loader.find("a.ftl").unwrap().unwrap().version;
        assert_ne!(first, second);

        loader.touch("a.ftl");
        let third = loader.find("a.ftl").unwrap().unwrap().version;
        assert_ne!(second, third);
        assert_eq!(loader.find("a.ftl").unwrap().unwrap().content, "two");
    }
}

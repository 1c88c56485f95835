/*
 * name.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template name normalization.
//!
//! A possibly-relative reference is resolved against the location of the
//! template that mentions it into a canonical root-based name. Malformed
//! names are rejected up front, before any loader I/O.

use crate::error::{EngineError, EngineResult};

/// Normalize `name`, resolved against the root-based name of the referring
/// template (`base`), into a canonical root-based name.
///
/// A leading `/` makes the reference root-based regardless of the base.
/// `.` and `..` segments are resolved; `..` past the root is an error.
pub fn normalize(base: Option<&str>, name: &str) -> EngineResult<String> {
    if name.contains('\0') {
        return Err(EngineError::MalformedName {
            name: name.to_string(),
        });
    }
    // A ':' before the first '/' would be read as a scheme delimiter by
    // some loaders; too ambiguous to let through.
    let first_segment = name.split('/').next().unwrap_or("");
    if first_segment.contains(':') {
        return Err(EngineError::MalformedName {
            name: name.to_string(),
        });
    }

    let mut segments: Vec<&str> = Vec::new();
    if let Some(base) = base {
        if !name.starts_with('/') {
            // The base's directory, not the base itself.
            segments = base.split('/').collect();
            segments.pop();
        }
    }
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(EngineError::BackedOutOfRoot {
                        name: name.to_string(),
                    });
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(normalize(None, "index.ftl").unwrap(), "index.ftl");
        assert_eq!(normalize(None, "mail/order.ftl").unwrap(), "mail/order.ftl");
    }

    #[test]
    fn test_relative_resolution_against_base() {
        assert_eq!(
            normalize(Some("mail/order.ftl"), "footer.ftl").unwrap(),
            "mail/footer.ftl"
        );
        assert_eq!(
            normalize(Some("mail/order.ftl"), "../common/header.ftl").unwrap(),
            "common/header.ftl"
        );
        // Root-based references ignore the base.
        assert_eq!(
            normalize(Some("mail/order.ftl"), "/index.ftl").unwrap(),
            "index.ftl"
        );
    }

    #[test]
    fn test_dot_segments_collapse() {
        assert_eq!(
            normalize(None, "./a/./b/../c.ftl").unwrap(),
            "a/c.ftl"
        );
    }

    #[test]
    fn test_backing_out_of_root_is_rejected() {
        let err = normalize(None, "../secret.ftl").unwrap_err();
        assert!(matches!(err, EngineError::BackedOutOfRoot { .. }));

        let err = normalize(Some("a.ftl"), "../../b.ftl").unwrap_err();
        assert!(matches!(err, EngineError::BackedOutOfRoot { .. }));
    }

    #[test]
    fn test_malformed_names_are_rejected_before_io() {
        for bad in ["bad\0name.ftl", "scheme:name.ftl"] {
            let err = normalize(None, bad).unwrap_err();
            assert!(matches!(err, EngineError::MalformedName { .. }), "{bad:?}");
        }
        // A ':' after the first '/' is a plain character, not a scheme.
        assert!(normalize(None, "dir/a:b.ftl").is_ok());
    }
}

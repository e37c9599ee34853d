//! Path to object key normalization.
//!
//! Object stores have a flat key namespace. Callers hand us filesystem-like
//! paths, so every path is lexically normalized into a key relative to the
//! bucket root before it reaches the store. A key can never resolve above
//! the root.

use crate::constants::{CURRENT_SEGMENT, KEY_SEPARATOR, PARENT_SEGMENT};
use crate::error::PathError;

/// Convert any backslash separators to forward slashes.
///
/// # Arguments
/// * `path` - Raw user supplied path
///
/// # Returns
/// The path using only `/` as separator.
pub fn to_posix_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalize a user supplied path into an object key.
///
/// Walks the segments left to right: `.` and empty segments are dropped and
/// `..` pops the previously pushed segment. Leading and trailing slashes are
/// not preserved. An empty result is the bucket root.
///
/// # Arguments
/// * `path` - Raw path, with either separator style
///
/// # Returns
/// The normalized key (possibly empty).
///
/// # Errors
/// Returns `PathError::PathTraversal` if a `..` would climb above the root.
pub fn normalize_key(path: &str) -> Result<String, PathError> {
    let posix: String = to_posix_separators(path);
    let mut segments: Vec<&str> = Vec::new();

    for segment in posix.split(KEY_SEPARATOR) {
        match segment {
            "" | CURRENT_SEGMENT => {}
            PARENT_SEGMENT => {
                if segments.pop().is_none() {
                    return Err(PathError::PathTraversal {
                        path: path.to_string(),
                    });
                }
            }
            _ => segments.push(segment),
        }
    }

    Ok(segments.join("/"))
}

/// Normalize a path that must name an object rather than the root.
///
/// # Arguments
/// * `path` - Raw path
///
/// # Errors
/// Returns `PathError::PathTraversal` on upward escape, or
/// `PathError::InvalidPath` when the path normalizes to the root.
pub fn normalize_file_key(path: &str) -> Result<String, PathError> {
    let key: String = normalize_key(path)?;
    if key.is_empty() {
        return Err(PathError::invalid(path, "path resolves to the bucket root"));
    }
    Ok(key)
}

/// Turn a normalized key into a listing prefix.
///
/// # Arguments
/// * `key` - Normalized key
///
/// # Returns
/// The empty string for the root, otherwise the key with exactly one
/// trailing `/`.
pub fn directory_prefix(key: &str) -> String {
    let trimmed: &str = key.trim_end_matches(KEY_SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Strip a listing prefix from a full key.
///
/// # Arguments
/// * `key` - Full object key
/// * `prefix` - Listing prefix as produced by [`directory_prefix`]
///
/// # Returns
/// The key relative to the prefix, or `None` if the key lies outside it.
pub fn relative_to_prefix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_simple() {
        assert_eq!(normalize_key("a/b/c.txt").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_normalize_strips_slashes() {
        assert_eq!(normalize_key("/a/b/").unwrap(), "a/b");
        assert_eq!(normalize_key("//a//b//").unwrap(), "a/b");
    }

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_key(r"notes\sub\a.txt").unwrap(), "notes/sub/a.txt");
    }

    #[test]
    fn test_normalize_removes_dot() {
        assert_eq!(normalize_key("./a/./b").unwrap(), "a/b");
    }

    #[test]
    fn test_normalize_resolves_dotdot() {
        assert_eq!(normalize_key("a/b/../c").unwrap(), "a/c");
        assert_eq!(normalize_key("a/b/c/../../d").unwrap(), "a/d");
    }

    #[test]
    fn test_normalize_dotdot_to_root() {
        assert_eq!(normalize_key("a/..").unwrap(), "");
    }

    #[test]
    fn test_normalize_empty_is_root() {
        assert_eq!(normalize_key("").unwrap(), "");
        assert_eq!(normalize_key("/").unwrap(), "");
        assert_eq!(normalize_key("./.").unwrap(), "");
    }

    #[test]
    fn test_normalize_rejects_traversal() {
        for path in ["..", "../x", "a/../../b", "/../etc/passwd", r"a\..\..\b"] {
            let result: Result<String, PathError> = normalize_key(path);
            assert!(
                matches!(result, Err(PathError::PathTraversal { .. })),
                "expected traversal error for {:?}",
                path
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs: [&str; 8] = [
            "a/b/c",
            "/a//b/",
            "./a/./b/../c",
            r"x\y\z",
            "",
            "deep/nested/../../flat",
            "name with spaces/file.txt",
            "a/.../b",
        ];
        for input in inputs {
            let once: String = normalize_key(input).unwrap();
            let twice: String = normalize_key(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_file_key_rejects_root() {
        let result: Result<String, PathError> = normalize_file_key("/./");
        assert!(matches!(result, Err(PathError::InvalidPath { .. })));
        assert_eq!(normalize_file_key("a.txt").unwrap(), "a.txt");
    }

    #[test]
    fn test_directory_prefix() {
        assert_eq!(directory_prefix(""), "");
        assert_eq!(directory_prefix("notes"), "notes/");
        assert_eq!(directory_prefix("notes/"), "notes/");
        assert_eq!(directory_prefix("notes//"), "notes/");
    }

    #[test]
    fn test_relative_to_prefix() {
        assert_eq!(relative_to_prefix("notes/a.txt", "notes/"), Some("a.txt"));
        assert_eq!(relative_to_prefix("notes/a.txt", ""), Some("notes/a.txt"));
        assert_eq!(relative_to_prefix("other/a.txt", "notes/"), None);
    }
}

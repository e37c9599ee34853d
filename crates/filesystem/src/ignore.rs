//! Glob-based ignore filter for directory listings.
//!
//! Patterns use standard glob syntax and are matched against the key
//! relative to the listed directory:
//! - `*` matches across separators, so `*.tmp` skips temp files at any depth
//! - `**` for explicit recursive matching
//! - Brace expansion like `*.{png,jpg}`
//! - Character classes like `[abc]`

use globset::{Glob, GlobSet, GlobSetBuilder};
use s3_providers_storage::KeyFilter;

use crate::error::FsError;

/// Set of glob patterns whose matches are dropped from a listing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    /// Source patterns.
    patterns: Vec<String>,
    /// Compiled patterns.
    set: Option<GlobSet>,
}

impl IgnoreFilter {
    /// Create a filter with no patterns (ignores nothing).
    pub fn none() -> Self {
        Self::default()
    }

    /// Compile a filter from glob patterns.
    ///
    /// # Arguments
    /// * `patterns` - Glob patterns for keys to skip
    ///
    /// # Errors
    /// Returns `FsError::InvalidIgnorePattern` if any pattern is invalid.
    pub fn new<I, S>(patterns: I) -> Result<Self, FsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Ok(Self::none());
        }

        let mut builder: GlobSetBuilder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob: Glob = Glob::new(pattern).map_err(|e| FsError::InvalidIgnorePattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            builder.add(glob);
        }
        let set: GlobSet = builder.build().map_err(|e| FsError::InvalidIgnorePattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self {
            patterns,
            set: Some(set),
        })
    }

    /// Check if a relative key matches any pattern.
    ///
    /// # Arguments
    /// * `path` - POSIX-style key relative to the listed directory
    pub fn matches(&self, path: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(path),
            None => false,
        }
    }

    /// Check if the filter has any patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Get the source patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl KeyFilter for IgnoreFilter {
    fn is_ignored(&self, relative_path: &str) -> bool {
        self.matches(relative_path)
    }
}

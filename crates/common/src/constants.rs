//! Shared constants used across the S3 provider crates.

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '/';

/// Lexical parent-directory segment.
pub const PARENT_SEGMENT: &str = "..";

/// Lexical current-directory segment.
pub const CURRENT_SEGMENT: &str = ".";

/// Content type used when an upload does not specify one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

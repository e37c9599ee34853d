//! Shared types and utilities for the S3 providers.
//!
//! This crate provides common functionality used across all provider crates:
//! - Path to object key normalization
//! - Directory prefix helpers
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod path_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::PathError;
pub use path_utils::{
    directory_prefix, normalize_file_key, normalize_key, relative_to_prefix, to_posix_separators,
};

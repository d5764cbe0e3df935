//! # Error Handling
//!
//! This module defines the centralized error type for the `resource-merge`
//! library. It uses the `thiserror` library to create an `Error` enum that
//! covers every failure mode the library reports to callers.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant corresponds to a specific kind
//!   of failure and carries the context needed to diagnose it.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into three groups:
//!
//! - Misuse of the merge engine: an inconsistent child handed to
//!   `set_children`, or a mutation the priority-folding map does not support.
//! - Manifest problems: YAML that does not describe a valid repository tree,
//!   or a folder configuration string that cannot be parsed.
//! - Wrapped errors from I/O, `serde_yaml`, `serde_json`, `regex` and `glob`.
//!
//! Stale invalidation events are not errors and never surface here. Invariant
//! violations inside the merge engine (an item whose repository has no known
//! priority) panic instead of returning an error, since continuing would
//! silently corrupt override semantics.

use thiserror::Error;

/// Main error type for resource-merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing a repository manifest.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Manifest parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// A child handed to `set_children` is inconsistent with the tree it is
    /// being added to.
    #[error("Invalid child repository {child}: {message}")]
    InvalidChild { child: String, message: String },

    /// A mutation was attempted that the collection does not support.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// A folder configuration qualifier could not be parsed.
    #[error("Invalid folder configuration '{qualifier}': {message}")]
    InvalidConfiguration { qualifier: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

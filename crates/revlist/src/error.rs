#![forbid(unsafe_code)]

//! Error types for the versioned list.
//!
//! Validation rejections and missing checkpoints are not errors: the former
//! silently filter, the latter are reported as `false` returns. Everything
//! that can surface to the caller lives here.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T, E = HistoryError> = std::result::Result<T, E>;

/// Structured text could not be turned into a sequence or a history.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is not valid JSON, or does not have the expected shape.
    #[error("malformed structured text: {0}")]
    Json(#[from] serde_json::Error),

    /// The text parsed to an entries array with no entries.
    #[error("history must contain at least one entry")]
    EmptyHistory,
}

/// Errors raised by history navigation, import and deferred evaluation.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// `jump`/`go_to` would move the cursor outside `[0, len)`.
    #[error("history index {target} out of range (entries: {len})")]
    OutOfRange { target: isize, len: usize },

    /// `import` received text that is not a valid entries array.
    #[error("import failed: {0}")]
    Parse(#[from] ParseError),

    /// A deferred command named a method the list does not expose.
    #[error("unknown deferred command `{0}`")]
    UnknownCommand(String),

    /// A deferred command was recorded with arguments it cannot use.
    #[error("invalid arguments for `{method}`: {reason}")]
    InvalidArguments { method: String, reason: String },
}

/// Errors raised while loading a [`ListConfig`](crate::ListConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The config parsed but holds unusable values.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

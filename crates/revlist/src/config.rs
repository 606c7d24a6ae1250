#![forbid(unsafe_code)]

//! Tunables for a [`VersionedList`](crate::VersionedList).
//!
//! ```toml
//! # revlist.toml
//! max_entries = 200
//! csv_delimiter = ";"
//! flatten_depth = 16
//! ```
//!
//! ```rust,ignore
//! let config = ListConfig::from_toml_file("revlist.toml")?;
//! let config = ListConfig::from_json_str(r#"{"max_entries": 50}"#)?;
//! ```
//!
//! Every field has a default, so partial files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default recursion bound for CSV flattening.
pub const DEFAULT_FLATTEN_DEPTH: usize = 64;

/// Configuration for a versioned list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Maximum number of history entries retained after each recorded
    /// mutation. `None` keeps every entry.
    pub max_entries: Option<usize>,
    /// Delimiter used by the CSV exporters.
    pub csv_delimiter: String,
    /// How many levels of nested arrays/objects CSV flattening descends
    /// before writing the remainder as compact JSON.
    pub flatten_depth: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            max_entries: None,
            csv_delimiter: ",".to_string(),
            flatten_depth: DEFAULT_FLATTEN_DEPTH,
        }
    }
}

impl ListConfig {
    /// Configuration that keeps at most `max_entries` history entries.
    #[must_use]
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    /// Set the history depth limit.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Set the CSV delimiter.
    #[must_use]
    pub fn with_csv_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.csv_delimiter = delimiter.into();
        self
    }

    /// Set the CSV flattening depth.
    #[must_use]
    pub fn with_flatten_depth(mut self, depth: usize) -> Self {
        self.flatten_depth = depth;
        self
    }

    /// Check that all values are usable.
    ///
    /// Returns a list of problems; an empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_entries == Some(0) {
            errors.push("max_entries must be at least 1".to_string());
        }
        if self.csv_delimiter.is_empty() {
            errors.push("csv_delimiter must not be empty".to_string());
        }
        errors
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_config(path.as_ref())?)
    }

    /// Load from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }

    /// Return `self` when [`validate`](Self::validate) finds no problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

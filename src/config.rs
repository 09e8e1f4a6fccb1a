//! Record store configuration
//!
//! Controls where the primary key sits in the delimited header, which
//! delimiter separates header tokens, and how headers are written back.
//! Can be built in code or loaded from a JSON file:
//!
//! ```json
//! { "key_index": 1, "delimiter": "|", "header_style": "compact" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};
use crate::store::{StoreError, StoreResult};

/// Default header token delimiter
pub const DEFAULT_DELIMITER: &str = "|";

/// How the header section before the metadata JSON is terminated on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// `>key|f1` or `>key|f1|{...}`: the delimiter only precedes metadata,
    /// or a last field that would otherwise be misread
    Compact,
    /// `>key|f1|` or `>key|f1|{...}`: the delimiter is always appended
    #[default]
    TrailingDelimiter,
}

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Zero-based position of the primary key among header tokens (default: 0)
    #[serde(default)]
    pub key_index: usize,

    /// Header token delimiter (default: "|")
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Header emission policy (default: trailing delimiter)
    #[serde(default)]
    pub header_style: HeaderStyle,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_index: 0,
            delimiter: default_delimiter(),
            header_style: HeaderStyle::default(),
        }
    }
}

impl StoreConfig {
    /// Create a config with the given key position and delimiter
    pub fn new(key_index: usize, delimiter: impl Into<String>) -> Self {
        Self {
            key_index,
            delimiter: delimiter.into(),
            ..Default::default()
        }
    }

    /// Set the key index
    pub fn with_key_index(mut self, key_index: usize) -> Self {
        self.key_index = key_index;
        self
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the header emission policy
    pub fn with_header_style(mut self, header_style: HeaderStyle) -> Self {
        self.header_style = header_style;
        self
    }

    /// Parse and validate a config from JSON text
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidConfig(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a JSON file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidConfig(format!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_json_str(&json)?;

        let path_str = path.display().to_string();
        let key_index = config.key_index.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path_str.as_str()),
                ("key_index", key_index.as_str()),
                ("delimiter", config.delimiter.as_str()),
            ],
        );

        Ok(config)
    }

    /// Rejects configurations that cannot split a header
    pub fn validate(&self) -> StoreResult<()> {
        if self.delimiter.is_empty() {
            return Err(StoreError::InvalidConfig(
                "delimiter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

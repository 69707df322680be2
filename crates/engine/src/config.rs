//! Collection configuration via TOML
//!
//! A collection can be opened from a small config file that names it and
//! lists the indexes to declare up front. Every field is optional; an empty
//! file yields the defaults.

use minidoc_core::{Error, Result};
use minidoc_storage::IndexFields;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default collection name when the config does not set one
pub const DEFAULT_COLLECTION_NAME: &str = "default";

/// Collection configuration.
///
/// # Example
///
/// ```toml
/// name = "people"
/// indexes = [["name"], ["age", "name"]]
/// fast_clear = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name, used in diagnostics
    #[serde(default = "default_name")]
    pub name: String,
    /// Field lists to declare as indexes when the collection opens
    #[serde(default)]
    pub indexes: Vec<Vec<String>>,
    /// Allow `remove({})` to clear the table in one step while observers
    /// are paused and no originals are being saved
    #[serde(default = "default_fast_clear")]
    pub fast_clear: bool,
}

fn default_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

fn default_fast_clear() -> bool {
    true
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            indexes: Vec::new(),
            fast_clear: default_fast_clear(),
        }
    }
}

impl CollectionConfig {
    /// Config with a name and default settings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an index declaration
    pub fn with_index<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# minidoc collection configuration
#
# Name used in log output.
name = "default"

# Indexes declared when the collection opens. Each entry is a list of
# top-level field names; order does not matter.
# indexes = [["name"], ["age", "name"]]
indexes = []

# Let remove({}) clear the whole table at once while observers are paused
# and no originals are being saved (default: true).
fast_clear = true
"#
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed TOML, and
    /// `Error::UnsupportedIndexField` on an invalid index declaration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CollectionConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse collection config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Canonical field lists for every declared index
    pub fn index_fields(&self) -> Result<Vec<IndexFields>> {
        self.indexes
            .iter()
            .map(|fields| IndexFields::new(fields.iter().cloned()))
            .collect()
    }

    /// Check every index declaration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("collection name must not be empty".into()));
        }
        self.index_fields().map(|_| ())
    }
}

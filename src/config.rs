//! Engine configuration
//!
//! Settings can come from a JSON file; command-line flags override them.

use crate::codec::Delimiter;
use crate::error::{Result, TabsyncError};
use crate::model::Key;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings shared by the differ, compiler, applier and orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Header labels carry `name type` instead of bare names
    pub typed_header: bool,
    pub delimiter: Delimiter,
    pub key: Option<Key>,
    /// Table written to when it differs from the one rows are read from
    pub target_table: Option<String>,
    pub progress: bool,
}

impl EngineConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TabsyncError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            TabsyncError::configuration(format!(
                "Invalid config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(key) = &self.key {
            // re-run the constructor checks for keys that came through serde
            Key::new(key.columns().iter().cloned())?;
        }
        if let Some(table) = &self.target_table {
            if table.trim().is_empty() {
                return Err(TabsyncError::configuration("target table name is empty"));
            }
        }
        Ok(())
    }

    pub fn with_key(mut self, key: Option<Key>) -> Self {
        if key.is_some() {
            self.key = key;
        }
        self
    }

    pub fn with_typed_header(mut self, typed_header: bool) -> Self {
        self.typed_header |= typed_header;
        self
    }

    pub fn with_tab_delimiter(mut self, tab: bool) -> Self {
        if tab {
            self.delimiter = Delimiter::Tab;
        }
        self
    }

    pub fn with_target_table(mut self, target_table: Option<String>) -> Self {
        if target_table.is_some() {
            self.target_table = target_table;
        }
        self
    }
}

//! Database settings for docapi.
//!
//! One connection string, one database name and one collection name per
//! entity type. The settings can be embedded in the server configuration or
//! loaded on their own from YAML.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! connection_string: "redb:///var/lib/docapi/docapi.redb"
//! database_name: "doujin_api"
//! users_collection_name: "users"
//! logs_collection_name: "logs"
//! settings_collection_name: "settings"
//! stats_collection_name: "stats"
//! doujins_collection_name: "doujins"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading database settings
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Where the document store lives and how its collections are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// `memory://`, `redb://<path>` or a bare redb file path
    #[serde(default = "default_connection_string")]
    pub connection_string: String,

    /// Prefix shared by every collection of this deployment
    #[serde(default = "default_database_name")]
    pub database_name: String,

    #[serde(default = "default_users_collection")]
    pub users_collection_name: String,

    #[serde(default = "default_logs_collection")]
    pub logs_collection_name: String,

    #[serde(default = "default_settings_collection")]
    pub settings_collection_name: String,

    #[serde(default = "default_stats_collection")]
    pub stats_collection_name: String,

    #[serde(default = "default_doujins_collection")]
    pub doujins_collection_name: String,
}

impl DatabaseSettings {
    /// In-memory settings with default collection names.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let settings: DatabaseSettings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject empty names and collections that would share storage.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.connection_string.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "connection_string must not be empty".into(),
            ));
        }
        if self.database_name.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "database_name must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (field, name) in self.collections() {
            if name.trim().is_empty() {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} `{name}` is used by more than one entity"
                )));
            }
        }
        Ok(())
    }

    /// Fully qualified collection name: `<database>.<collection>`.
    pub fn qualified(&self, collection: &str) -> String {
        format!("{}.{}", self.database_name, collection)
    }

    fn collections(&self) -> [(&'static str, &str); 5] {
        [
            ("users_collection_name", &self.users_collection_name),
            ("logs_collection_name", &self.logs_collection_name),
            ("settings_collection_name", &self.settings_collection_name),
            ("stats_collection_name", &self.stats_collection_name),
            ("doujins_collection_name", &self.doujins_collection_name),
        ]
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_string: default_connection_string(),
            database_name: default_database_name(),
            users_collection_name: default_users_collection(),
            logs_collection_name: default_logs_collection(),
            settings_collection_name: default_settings_collection(),
            stats_collection_name: default_stats_collection(),
            doujins_collection_name: default_doujins_collection(),
        }
    }
}

fn default_connection_string() -> String {
    "memory://".to_string()
}
fn default_database_name() -> String {
    "docapi".to_string()
}
fn default_users_collection() -> String {
    "users".to_string()
}
fn default_logs_collection() -> String {
    "logs".to_string()
}
fn default_settings_collection() -> String {
    "settings".to_string()
}
fn default_stats_collection() -> String {
    "stats".to_string()
}
fn default_doujins_collection() -> String {
    "doujins".to_string()
}

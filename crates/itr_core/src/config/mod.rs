use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DB_PATH_ENV: &str = "ITR_DB_PATH";

/// Store settings, read from TOML:
///
/// ```toml
/// db_path = "/var/lib/itr/incidents.sqlite"
/// create_if_missing = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("incidents.sqlite"),
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| {
            AppError::new("CONFIG_PARSE_FAILED", "Failed to parse store config")
                .with_details(e.to_string())
        })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read store config")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from a variable lookup (`std::env::var` in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.db_path = PathBuf::from(path);
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn connect(&self) -> Result<Connection, AppError> {
        crate::workspace::connect(&self.db_path, self.create_if_missing)
    }
}

use std::path::Path;
use std::time::Duration;

use itr_core::error::AppError;
use itr_core::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Client settings, read from TOML. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001/api".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: 500,
            timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let cfg: Self = toml::from_str(text).map_err(|e| {
            AppError::new("CONFIG_PARSE_FAILED", "Failed to parse client config")
                .with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read client config")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "page_size must be between 1 and 100",
            )
            .with_details(format!("page_size={}", self.page_size)));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

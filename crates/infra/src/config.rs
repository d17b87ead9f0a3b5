//! Configuration loading and representation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_STORAGE_ROOT: &str = "CONTENTMART_STORAGE_ROOT";
pub const ENV_MAX_FILE_SIZE: &str = "CONTENTMART_MAX_FILE_SIZE";
pub const ENV_STARTING_BALANCE: &str = "CONTENTMART_STARTING_BALANCE";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Marketplace settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Directory packages are stored under.
    pub storage_root: PathBuf,
    /// Per-file upload limit in bytes.
    pub max_file_size: u64,
    /// Balance credited to a freshly registered user.
    pub starting_balance: i64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("data/packages"),
            max_file_size: 100 * 1024 * 1024,
            starting_balance: 0,
            log_filter: "info".to_string(),
        }
    }
}

impl MarketConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_STORAGE_ROOT).filter(|v| !v.trim().is_empty()) {
            config.storage_root = PathBuf::from(root);
        }
        if let Some(raw) = lookup(ENV_MAX_FILE_SIZE) {
            config.max_file_size = parse(ENV_MAX_FILE_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STARTING_BALANCE) {
            config.starting_balance = parse(ENV_STARTING_BALANCE, &raw)?;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_file_size",
                value: "0".to_string(),
            });
        }
        if self.starting_balance < 0 {
            return Err(ConfigError::InvalidValue {
                key: "starting_balance",
                value: self.starting_balance.to_string(),
            });
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

//! Runtime settings. Every field has a default, so an absent or partial
//! config file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "BLOOMIE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatGuardSettings {
    pub max_messages: usize,
    pub window_secs: u64,
    pub block_secs: u64,
    pub duplicate_threshold: usize,
    pub duplicate_window_secs: u64,
    pub max_links: usize,
    pub blacklist: Vec<String>,
    /// Spam violations before the account's chat is blocked.
    pub violations_before_block: u32,
    /// Violation counts with no new violation for this long are forgotten.
    pub violation_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ChatGuardSettings {
    fn default() -> Self {
        Self {
            max_messages: 5,
            window_secs: 60,
            block_secs: 30,
            duplicate_threshold: 3,
            duplicate_window_secs: 300,
            max_links: 3,
            blacklist: vec!["lừa đảo".into(), "cờ bạc".into(), "casino".into(), "vay tiền".into()],
            violations_before_block: 3,
            violation_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl ChatGuardSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn block(&self) -> Duration {
        Duration::from_secs(self.block_secs)
    }

    pub fn duplicate_window(&self) -> Duration {
        Duration::from_secs(self.duplicate_window_secs)
    }

    pub fn violation_ttl(&self) -> Duration {
        Duration::from_secs(self.violation_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub actor_buffer: usize,
    pub notification_capacity: usize,
    pub assignment_timeout_secs: u64,
    pub proof_folder: PathBuf,
    pub proof_max_bytes: u64,
    pub proof_extensions: Vec<String>,
    /// VND spent per loyalty point.
    pub vnd_per_loyalty_point: Decimal,
    pub low_stock_threshold: u32,
    pub chat: ChatGuardSettings,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 32,
            notification_capacity: 256,
            assignment_timeout_secs: 300,
            proof_folder: PathBuf::from("uploads/delivery-proofs"),
            proof_max_bytes: 5 * 1024 * 1024,
            proof_extensions: vec!["jpg".into(), "jpeg".into(), "png".into(), "webp".into()],
            vnd_per_loyalty_point: Decimal::from(10_000),
            low_stock_threshold: 5,
            chat: ChatGuardSettings::default(),
        }
    }
}

impl ShopConfig {
    /// Reads the file named by `BLOOMIE_CONFIG`, or returns the defaults when
    /// the variable is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.actor_buffer == 0 {
            return Err(ConfigError::Invalid { field: "actor_buffer", reason: "must be positive".into() });
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "notification_capacity",
                reason: "must be positive".into(),
            });
        }
        if self.vnd_per_loyalty_point <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "vnd_per_loyalty_point",
                reason: "must be positive".into(),
            });
        }
        if self.chat.max_messages == 0 || self.chat.violations_before_block == 0 {
            return Err(ConfigError::Invalid { field: "chat", reason: "limits must be positive".into() });
        }
        if self.chat.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "chat.sweep_interval_secs",
                reason: "must be positive".into(),
            });
        }
        if self.chat.violation_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "chat.violation_ttl_secs",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn assignment_timeout(&self) -> Duration {
        Duration::from_secs(self.assignment_timeout_secs)
    }
}

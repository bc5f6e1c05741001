//! Local configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use keyproof_store::{ConfigStore, StoreError};
use keyproof_types::PgpFingerprint;
use keyproof_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Configuration for the `keyproof` command.
///
/// Loaded from a TOML file via [`CliConfig::from_toml_file`]; every field
/// has a default so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// The fingerprint the local user accepted as their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgp_fingerprint: Option<PgpFingerprint>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long identify results stay cached. Unset keeps them for the
    /// life of the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    /// Never prompt during self-verification.
    #[serde(default)]
    pub background: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            pgp_fingerprint: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            cache_ttl_secs: None,
            background: false,
        }
    }
}

/// [`ConfigStore`] backed by a `CliConfig` TOML file.
///
/// Writes rewrite the whole file, keeping every other setting. A missing
/// file reads as an unconfigured fingerprint.
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CliConfig, StoreError> {
        if !self.path.exists() {
            return Ok(CliConfig::default());
        }
        CliConfig::from_toml_file(&self.path).map_err(|e| match e {
            ConfigError::Read { .. } => StoreError::Backend(e.to_string()),
            _ => StoreError::Serialization(e.to_string()),
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn pgp_fingerprint(&self) -> Result<Option<PgpFingerprint>, StoreError> {
        Ok(self.load()?.pgp_fingerprint)
    }

    fn set_pgp_fingerprint(&self, fingerprint: &PgpFingerprint) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut config = self.load()?;
        config.pgp_fingerprint = Some(*fingerprint);
        let content = config
            .to_toml_string()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

//! Engine configuration, read from camelCase JSON. Every field has a
//! default, so `{}` is a complete config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snippet_editor::LayoutOptions;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub accelerator: AcceleratorConfig,
    pub layout: LayoutConfig,
    pub reads: ReadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceleratorConfig {
    pub enabled: bool,
    pub load_timeout_ms: u64,
    /// How long a failed load is remembered before the next attempt
    pub retry_cooldown_ms: u64,
    /// Recompute every accelerated answer with the reference scan and keep
    /// the reference answer when they differ
    pub verify_parity: bool,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            load_timeout_ms: 2000,
            retry_cooldown_ms: 30_000,
            verify_parity: false,
        }
    }
}

impl AcceleratorConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_millis(self.retry_cooldown_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Pixels within which an alignment hint snaps the offset to zero
    pub snap_threshold: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { snap_threshold: 0.5 }
    }
}

impl LayoutConfig {
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            snap_threshold: self.snap_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadConfig {
    pub debounce_ms: u64,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self { debounce_ms: 16 }
    }
}

impl ReadConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}

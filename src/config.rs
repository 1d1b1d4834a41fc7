/// Benchmark settings
///
/// Loaded once at startup from the user's config directory:
/// - Linux: ~/.config/image-bench/settings.json
/// - macOS: ~/Library/Application Support/image-bench/settings.json
/// - Windows: %APPDATA%\image-bench\settings.json
///
/// A missing file means defaults. A broken file is logged and ignored.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    /// Files at or below this size are always considered fine to inline
    pub inline_threshold_bytes: u64,
    /// Inline must beat the external decode by at least this much
    pub inline_margin_ms: u64,
    /// How long temporary cache read-back references stay alive
    pub preview_grace_secs: u64,
    /// Override for the cache database location
    pub cache_path: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            inline_threshold_bytes: 2 * 1024,
            inline_margin_ms: 10,
            preview_grace_secs: 30,
            cache_path: None,
        }
    }
}

impl BenchConfig {
    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!("⚙️  Loaded settings from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️  Ignoring invalid settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("image-bench");
        path.push("settings.json");
        Some(path)
    }

    /// Where the cache database lives unless overridden
    pub fn cache_db_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cache_path {
            return Some(path.clone());
        }
        let mut path = dirs::cache_dir().or_else(dirs::home_dir)?;
        path.push("image-bench");
        path.push("cache.db");
        Some(path)
    }

    pub fn inline_margin(&self) -> Duration {
        Duration::from_millis(self.inline_margin_ms)
    }

    pub fn preview_grace(&self) -> Duration {
        Duration::from_secs(self.preview_grace_secs)
    }
}

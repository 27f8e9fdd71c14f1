//! Configuration management for coursier-cache

pub mod schema;

pub use schema::Config;

use crate::error::{CacheError, CacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = ".coursier-cache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a config manager for an explicit file
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Look for the project-local config file under `root`
    pub fn find_local_config(root: &Path) -> Option<PathBuf> {
        let candidate = root.join(LOCAL_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Get the local cache directory path
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coursier-cache")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coursier-cache")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> CacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file {} not found, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            CacheError::io(format!("reading config from {}", self.config_path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }
}

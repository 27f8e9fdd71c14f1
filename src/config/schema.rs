//! Configuration schema for coursier-cache
//!
//! Read from `.coursier-cache.toml` in the project root, or from the file
//! given with `--config`. Command-line flags and `INPUT_*` variables win
//! over file values.

use super::ConfigManager;
use crate::cache::Ecosystem;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Run-wide key segments
    pub key: KeyConfig,

    /// Umbrella Coursier cache
    pub coursier: EcosystemConfig,

    /// sbt cache
    pub sbt: EcosystemConfig,

    /// Mill cache
    pub mill: EcosystemConfig,

    /// Ammonite cache
    pub ammonite: EcosystemConfig,

    /// Blob store settings
    pub store: StoreConfig,

    /// Cross-phase state settings
    pub state: StateConfig,
}

impl Config {
    /// Settings of one ecosystem
    pub fn ecosystem(&self, ecosystem: Ecosystem) -> &EcosystemConfig {
        match ecosystem {
            Ecosystem::Coursier => &self.coursier,
            Ecosystem::Sbt => &self.sbt,
            Ecosystem::Mill => &self.mill,
            Ecosystem::Ammonite => &self.ammonite,
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Project root the build files are looked up in
    pub root: PathBuf,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            log_format: "text".to_string(),
        }
    }
}

/// Key segments shared by every ecosystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Job name (defaults to `$GITHUB_JOB`)
    pub job: Option<String>,

    /// Serialized matrix of the current job
    pub matrix: Option<String>,

    /// Leave the job name out of keys
    pub ignore_job: bool,

    /// Leave the matrix out of keys
    pub ignore_matrix: bool,

    /// Extra key segment added to every cache
    pub extra_key: Option<String>,
}

/// Per-ecosystem settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Storage paths, replacing the ecosystem defaults when non-empty
    pub paths: Vec<String>,

    /// Additional files (or globs) hashed into the key
    pub extra_files: Vec<String>,

    /// Additional content hashed into the key
    pub extra_hashed_content: String,

    /// Extra key segment for this ecosystem only
    pub extra_key: Option<String>,
}

/// Blob store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding cache entries
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| ConfigManager::cache_dir().join("store"))
    }
}

/// Where restore state is kept for the save phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// GitHub Actions when detected, otherwise a state file
    #[default]
    Auto,
    /// GitHub Actions file commands
    Github,
    /// JSON state file
    File,
}

/// Cross-phase state settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Host integration
    pub host: HostKind,

    /// State file for the `file` host
    pub file: Option<PathBuf>,
}

impl StateConfig {
    pub fn file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| ConfigManager::state_dir().join("state.json"))
    }
}

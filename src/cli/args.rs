//! CLI argument definitions using clap derive
//!
//! Every restore input can also come from an `INPUT_*` variable, which is how
//! a CI action hands its inputs to the process.

use crate::config::schema::{EcosystemConfig, HostKind};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// coursier-cache - Dependency cache orchestration for JVM builds
///
/// Restores the Coursier, sbt, Mill and Ammonite caches before a build and
/// saves them afterwards, under keys derived from the build definition.
#[derive(Parser, Debug)]
#[command(name = "coursier-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path (defaults to <root>/.coursier-cache.toml)
    #[arg(short, long, global = true, env = "COURSIER_CACHE_CONFIG")]
    pub config: Option<String>,

    /// Project root holding the build definition
    #[arg(long, global = true, env = "INPUT_ROOT")]
    pub root: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Where state is handed from restore to save
    #[arg(long, global = true, value_enum)]
    pub host: Option<HostKind>,

    /// State file used by the `file` host
    #[arg(long, global = true, env = "COURSIER_CACHE_STATE_FILE")]
    pub state_file: Option<String>,

    /// Directory holding saved cache entries
    #[arg(long, global = true, env = "COURSIER_CACHE_STORE")]
    pub store_dir: Option<String>,
}

impl Cli {
    /// Root used to discover the project-local config file
    pub fn discovery_root(&self) -> PathBuf {
        given_path(&self.root).unwrap_or_else(|| PathBuf::from("."))
    }

    /// Explicit config file, if one was given
    pub fn config_path(&self) -> Option<PathBuf> {
        given_path(&self.config)
    }

    /// Apply the global flags over file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = given_path(&self.root) {
            config.general.root = root;
        }
        if let Some(format) = self.log_format {
            config.general.log_format = format.as_str().to_string();
        }
        if let Some(host) = self.host {
            config.state.host = host;
        }
        if let Some(file) = given_path(&self.state_file) {
            config.state.file = Some(file);
        }
        if let Some(dir) = given_path(&self.store_dir) {
            config.store.dir = Some(dir);
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore caches before the build
    Restore(RestoreArgs),

    /// Save caches after the build
    Save,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Arguments for the restore command
#[derive(Args, Debug, Default)]
pub struct RestoreArgs {
    /// Coursier cache path (exported as COURSIER_CACHE)
    #[arg(long, env = "INPUT_PATH")]
    pub path: Option<String>,

    /// Job name used in keys (defaults to $GITHUB_JOB)
    #[arg(long, env = "INPUT_JOB")]
    pub job: Option<String>,

    /// Serialized job matrix used in keys
    #[arg(long, env = "INPUT_MATRIX")]
    pub matrix: Option<String>,

    /// Leave the job name out of keys
    #[arg(long, env = "INPUT_IGNOREJOB", num_args = 0..=1, default_missing_value = "true")]
    pub ignore_job: Option<String>,

    /// Leave the matrix out of keys
    #[arg(long, env = "INPUT_IGNOREMATRIX", num_args = 0..=1, default_missing_value = "true")]
    pub ignore_matrix: Option<String>,

    /// Extra key segment added to every cache
    #[arg(long, env = "INPUT_EXTRAKEY")]
    pub extra_key: Option<String>,

    /// Additional files hashed into the Coursier key (path or JSON array)
    #[arg(long, env = "INPUT_EXTRAFILES")]
    pub extra_files: Option<String>,

    /// Additional sbt files (path or JSON array)
    #[arg(long, env = "INPUT_EXTRASBTFILES")]
    pub extra_sbt_files: Option<String>,

    /// Additional Mill files (path or JSON array)
    #[arg(long, env = "INPUT_EXTRAMILLFILES")]
    pub extra_mill_files: Option<String>,

    /// Additional Ammonite scripts (path or JSON array)
    #[arg(long, env = "INPUT_AMMONITESCRIPTS")]
    pub ammonite_scripts: Option<String>,

    /// Additional content hashed into the Coursier key
    #[arg(long, env = "INPUT_EXTRAHASHEDCONTENT")]
    pub extra_hashed_content: Option<String>,

    /// Additional content hashed into the sbt key
    #[arg(long, env = "INPUT_EXTRASBTHASHEDCONTENT")]
    pub extra_sbt_hashed_content: Option<String>,

    /// Additional content hashed into the Mill key
    #[arg(long, env = "INPUT_EXTRAMILLHASHEDCONTENT")]
    pub extra_mill_hashed_content: Option<String>,

    /// Additional content hashed into the Ammonite key
    #[arg(long, env = "INPUT_EXTRAAMMONITEHASHEDCONTENT")]
    pub extra_ammonite_hashed_content: Option<String>,

    /// Extra key segment for the Coursier cache only
    #[arg(long, env = "INPUT_EXTRACOURSIERKEY")]
    pub extra_coursier_key: Option<String>,

    /// Extra key segment for the sbt cache only
    #[arg(long, env = "INPUT_EXTRASBTKEY")]
    pub extra_sbt_key: Option<String>,

    /// Extra key segment for the Mill cache only
    #[arg(long, env = "INPUT_EXTRAMILLKEY")]
    pub extra_mill_key: Option<String>,

    /// Extra key segment for the Ammonite cache only
    #[arg(long, env = "INPUT_EXTRAAMMONITEKEY")]
    pub extra_ammonite_key: Option<String>,
}

impl RestoreArgs {
    /// Apply restore inputs over file configuration. Empty values count as
    /// not given.
    pub fn apply(&self, config: &mut Config) -> CacheResult<()> {
        if let Some(path) = given(&self.path) {
            config.coursier.paths = vec![path.to_string()];
        }
        if let Some(job) = given(&self.job) {
            config.key.job = Some(job.to_string());
        }
        if let Some(matrix) = given(&self.matrix) {
            config.key.matrix = Some(matrix.to_string());
        }
        config.key.ignore_job |= enabled(&self.ignore_job);
        config.key.ignore_matrix |= enabled(&self.ignore_matrix);
        if let Some(extra_key) = given(&self.extra_key) {
            config.key.extra_key = Some(extra_key.to_string());
        }

        apply_ecosystem(
            &mut config.coursier,
            &self.extra_files,
            &self.extra_hashed_content,
            &self.extra_coursier_key,
        )?;
        apply_ecosystem(
            &mut config.sbt,
            &self.extra_sbt_files,
            &self.extra_sbt_hashed_content,
            &self.extra_sbt_key,
        )?;
        apply_ecosystem(
            &mut config.mill,
            &self.extra_mill_files,
            &self.extra_mill_hashed_content,
            &self.extra_mill_key,
        )?;
        apply_ecosystem(
            &mut config.ammonite,
            &self.ammonite_scripts,
            &self.extra_ammonite_hashed_content,
            &self.extra_ammonite_key,
        )?;
        Ok(())
    }
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn given_path(value: &Option<String>) -> Option<PathBuf> {
    given(value).map(PathBuf::from)
}

/// Boolean input: only `true` (any case) turns it on
fn enabled(value: &Option<String>) -> bool {
    given(value).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn apply_ecosystem(
    eco: &mut EcosystemConfig,
    files: &Option<String>,
    hashed_content: &Option<String>,
    extra_key: &Option<String>,
) -> CacheResult<()> {
    if let Some(files) = given(files) {
        eco.extra_files = parse_file_list(files)?;
    }
    if let Some(content) = given(hashed_content) {
        eco.extra_hashed_content = content.to_string();
    }
    if let Some(key) = given(extra_key) {
        eco.extra_key = Some(key.to_string());
    }
    Ok(())
}

/// Parse a file list input: a single path or glob, or a JSON array of them
pub fn parse_file_list(value: &str) -> CacheResult<Vec<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.starts_with('[') {
        return Ok(vec![trimmed.to_string()]);
    }

    let files: Vec<String> =
        serde_json::from_str(trimmed).map_err(|e| CacheError::FileList {
            value: trimmed.to_string(),
            reason: e.to_string(),
        })?;
    Ok(files.into_iter().filter(|f| !f.trim().is_empty()).collect())
}

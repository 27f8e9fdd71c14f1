//! GitHub Actions file commands
//!
//! Values written to `$GITHUB_STATE` during the main step come back to the
//! post step as `STATE_<name>` environment variables.

use super::{Host, OutputSink, StateStore};
use crate::error::{CacheError, CacheResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const STATE_FILE_VAR: &str = "GITHUB_STATE";
const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";
const ENV_FILE_VAR: &str = "GITHUB_ENV";

/// Host backed by the GitHub Actions runner
#[derive(Debug, Clone)]
pub struct GithubHost {
    state_file: PathBuf,
    output_file: PathBuf,
    env_file: PathBuf,
}

impl GithubHost {
    pub fn new(state_file: PathBuf, output_file: PathBuf, env_file: PathBuf) -> Self {
        Self {
            state_file,
            output_file,
            env_file,
        }
    }

    /// Locate the runner's command files
    pub fn from_env() -> CacheResult<Self> {
        let var = |name: &str| {
            std::env::var_os(name)
                .map(PathBuf::from)
                .ok_or_else(|| CacheError::HostEnvMissing(name.to_string()))
        };
        Ok(Self::new(
            var(STATE_FILE_VAR)?,
            var(OUTPUT_FILE_VAR)?,
            var(ENV_FILE_VAR)?,
        ))
    }

    /// Whether this process runs inside a GitHub Actions job
    pub fn detected() -> bool {
        std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
    }
}

/// Format a file command entry, using the heredoc form for multiline values
fn file_command(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let mut delimiter = format!("ghadelimiter_{}", std::process::id());
        while value.contains(&delimiter) {
            delimiter.push('_');
        }
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

fn append(path: &Path, name: &str, value: &str) -> CacheResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CacheError::io(format!("opening {}", path.display()), e))?;
    file.write_all(file_command(name, value).as_bytes())
        .map_err(|e| CacheError::io(format!("writing {}", path.display()), e))
}

impl StateStore for GithubHost {
    fn save_state(&self, name: &str, value: &str) -> CacheResult<()> {
        append(&self.state_file, name, value)
    }

    fn read_state(&self, name: &str) -> CacheResult<Option<String>> {
        Ok(std::env::var(format!("STATE_{name}"))
            .ok()
            .filter(|v| !v.is_empty()))
    }
}

impl OutputSink for GithubHost {
    fn set_output(&self, name: &str, value: &str) -> CacheResult<()> {
        append(&self.output_file, name, value)
    }

    fn export_variable(&self, name: &str, value: &str) -> CacheResult<()> {
        // Also visible to anything this process spawns
        std::env::set_var(name, value);
        append(&self.env_file, name, value)
    }
}

impl Host for GithubHost {
    fn host_name(&self) -> &'static str {
        "GitHub Actions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn host(dir: &TempDir) -> GithubHost {
        GithubHost::new(
            dir.path().join("state"),
            dir.path().join("output"),
            dir.path().join("env"),
        )
    }

    #[test]
    fn single_line_command() {
        assert_eq!(file_command("cache-hit-mill", "true"), "cache-hit-mill=true\n");
    }

    #[test]
    fn multiline_command_uses_delimiter() {
        let cmd = file_command("NOTE", "a\nb");
        assert!(cmd.starts_with("NOTE<<ghadelimiter_"));
        assert!(cmd.contains("\na\nb\n"));
    }

    #[test]
    fn writes_state_and_outputs() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);

        host.save_state("MILL_CACHE_KEY", "mill-abc").unwrap();
        host.save_state("MILL_CACHE_PATHS", r#"["~/.mill"]"#).unwrap();
        host.set_output("cache-hit-mill", "false").unwrap();

        let state = std::fs::read_to_string(dir.path().join("state")).unwrap();
        assert_eq!(
            state,
            "MILL_CACHE_KEY=mill-abc\nMILL_CACHE_PATHS=[\"~/.mill\"]\n"
        );
        let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
        assert_eq!(output, "cache-hit-mill=false\n");
    }

    #[test]
    #[serial]
    fn reads_state_from_env() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);

        std::env::set_var("STATE_TEST_GH_CACHE_KEY", "coursier-xyz");
        assert_eq!(
            host.read_state("TEST_GH_CACHE_KEY").unwrap().as_deref(),
            Some("coursier-xyz")
        );
        std::env::remove_var("STATE_TEST_GH_CACHE_KEY");
        assert!(host.read_state("TEST_GH_CACHE_KEY").unwrap().is_none());
    }
}

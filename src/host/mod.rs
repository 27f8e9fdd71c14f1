//! CI host integration
//!
//! The restore and save phases run as two separate processes. The host
//! carries a small string-to-string state map from one to the other, and
//! receives the step outputs (`cache-hit-<id>`) and exported variables.
//!
//! - GitHub Actions: `$GITHUB_STATE`, `$GITHUB_OUTPUT`, `$GITHUB_ENV`
//! - Any other runner: a JSON file on disk
//! - Tests: in memory

mod file;
mod github;
mod memory;

pub use file::FileHost;
pub use github::GithubHost;
pub use memory::MemoryHost;

use crate::config::schema::HostKind;
use crate::config::Config;
use crate::error::CacheResult;
use tracing::debug;

/// State handed from the restore phase to the save phase
pub trait StateStore: Send + Sync {
    /// Persist a named value for the next phase
    fn save_state(&self, name: &str, value: &str) -> CacheResult<()>;

    /// Read a value persisted by a previous phase (`None` if never saved)
    fn read_state(&self, name: &str) -> CacheResult<Option<String>>;
}

/// Step outputs and environment exported to later steps
pub trait OutputSink: Send + Sync {
    /// Set a step output such as `cache-hit-coursier`
    fn set_output(&self, name: &str, value: &str) -> CacheResult<()>;

    /// Export an environment variable to subsequent steps
    fn export_variable(&self, name: &str, value: &str) -> CacheResult<()>;
}

/// Full host interface
pub trait Host: StateStore + OutputSink {
    /// Get the human-readable host name for logs
    fn host_name(&self) -> &'static str;
}

/// Build the host selected by configuration
pub fn create_host(config: &Config) -> CacheResult<Box<dyn Host>> {
    let kind = match config.state.host {
        HostKind::Auto if GithubHost::detected() => HostKind::Github,
        HostKind::Auto => HostKind::File,
        kind => kind,
    };

    let host: Box<dyn Host> = match kind {
        HostKind::Github => Box::new(GithubHost::from_env()?),
        _ => {
            let host = FileHost::new(config.state.file());
            debug!("State file: {}", host.path().display());
            Box::new(host)
        }
    };
    debug!("Using {} host", host.host_name());
    Ok(host)
}

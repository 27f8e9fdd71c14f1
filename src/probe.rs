//! Host operating system detection
//!
//! The OS decides where Coursier keeps its cache by default. `uname -s` is
//! asked once per process; the answer is kept on the probe.

use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

/// Operating system family, as far as cache locations are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Darwin,
    Linux,
    Windows,
    Unknown,
}

impl HostOs {
    /// Classify the output of `uname -s`
    pub fn from_uname(uname: &str) -> Self {
        let uname = uname.trim();
        if uname.starts_with("Darwin") {
            Self::Darwin
        } else if uname.starts_with("Linux") {
            Self::Linux
        } else if ["CYGWIN", "MINGW", "MSYS"]
            .iter()
            .any(|prefix| uname.starts_with(prefix))
        {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    /// Fallback when `uname` is unavailable
    fn from_target() -> Self {
        match std::env::consts::OS {
            "macos" => Self::Darwin,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            _ => Self::Unknown,
        }
    }

    /// Default Coursier cache directory on this OS
    pub fn coursier_cache_path(&self) -> &'static str {
        match self {
            Self::Windows => "~\\AppData\\Local\\Coursier\\Cache",
            Self::Darwin => "~/Library/Caches/Coursier",
            Self::Linux | Self::Unknown => "~/.cache/coursier",
        }
    }
}

/// Lazily probes the OS and remembers the answer
#[derive(Debug, Default)]
pub struct OsProbe {
    os: OnceCell<HostOs>,
}

impl OsProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe with a known answer, skipping `uname`
    pub fn with_os(os: HostOs) -> Self {
        Self {
            os: OnceCell::new_with(Some(os)),
        }
    }

    pub async fn os(&self) -> HostOs {
        *self.os.get_or_init(Self::probe).await
    }

    async fn probe() -> HostOs {
        let output = Command::new("uname")
            .arg("-s")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let uname = String::from_utf8_lossy(&output.stdout);
                debug!("uname -s: {}", uname.trim());
                HostOs::from_uname(&uname)
            }
            _ => {
                debug!("uname unavailable, using compile target OS");
                HostOs::from_target()
            }
        }
    }
}

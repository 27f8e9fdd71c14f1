//! Supported JVM build tool ecosystems
//!
//! Each ecosystem owns a cache id, default storage paths and the names under
//! which its restore state is handed to the save phase. Coursier is the
//! umbrella cache: it is always restored and its key covers the build files
//! of every other ecosystem.

use std::fmt;

/// Supported ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// Coursier artifact cache, shared by every JVM build tool
    Coursier,
    /// sbt (`~/.sbt`, `~/.ivy2/cache`)
    Sbt,
    /// Mill (`~/.mill`)
    Mill,
    /// Ammonite scripts (`~/.ammonite`)
    Ammonite,
}

impl Ecosystem {
    /// Cache id used as the first key segment and in output names
    pub fn id(&self) -> &'static str {
        match self {
            Self::Coursier => "coursier",
            Self::Sbt => "sbt-ivy2-cache",
            Self::Mill => "mill",
            Self::Ammonite => "ammonite",
        }
    }

    /// Whether this is the umbrella cache, restored unconditionally
    pub fn is_umbrella(&self) -> bool {
        matches!(self, Self::Coursier)
    }

    /// Default storage paths. Coursier's depend on the OS and are resolved
    /// by the caller.
    pub fn default_paths(&self) -> &'static [&'static str] {
        match self {
            Self::Coursier => &[],
            Self::Sbt => &["~/.sbt", "~/.ivy2/cache"],
            Self::Mill => &["~/.mill"],
            Self::Ammonite => &["~/.ammonite"],
        }
    }

    /// Every ecosystem, in restore and save order
    pub fn all() -> &'static [Self] {
        &[Self::Coursier, Self::Sbt, Self::Mill, Self::Ammonite]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Names of the state entries recording one cache's restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNames {
    pub paths: String,
    pub key: String,
    pub result: String,
}

impl StateNames {
    pub fn for_id(id: &str) -> Self {
        let upper = id.to_uppercase();
        Self {
            paths: format!("{upper}_CACHE_PATHS"),
            key: format!("{upper}_CACHE_KEY"),
            result: format!("{upper}_CACHE_RESULT"),
        }
    }
}

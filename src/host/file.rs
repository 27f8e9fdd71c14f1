//! JSON-file host for runners without a native state mechanism

use super::{Host, OutputSink, StateStore};
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// On-disk layout of the state file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostDocument {
    pub state: BTreeMap<String, String>,
    pub outputs: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
}

/// Host that keeps state, outputs and exported variables in one JSON file
pub struct FileHost {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHost {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current document (empty if the file does not exist yet)
    pub fn load(&self) -> CacheResult<HostDocument> {
        if !self.path.exists() {
            return Ok(HostDocument::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| CacheError::io(format!("reading state file {}", self.path.display()), e))?;
        if content.trim().is_empty() {
            return Ok(HostDocument::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            CacheError::State(format!("state file {} is corrupt: {}", self.path.display(), e))
        })
    }

    fn update(&self, apply: impl FnOnce(&mut HostDocument)) -> CacheResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.load()?;
        apply(&mut doc);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io(format!("creating {}", parent.display()), e))?;
        }
        let content = serde_json::to_string_pretty(&doc)?;
        fs::write(&self.path, content)
            .map_err(|e| CacheError::io(format!("writing state file {}", self.path.display()), e))
    }
}

impl StateStore for FileHost {
    fn save_state(&self, name: &str, value: &str) -> CacheResult<()> {
        self.update(|doc| {
            doc.state.insert(name.to_string(), value.to_string());
        })
    }

    fn read_state(&self, name: &str) -> CacheResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self
            .load()?
            .state
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned())
    }
}

impl OutputSink for FileHost {
    fn set_output(&self, name: &str, value: &str) -> CacheResult<()> {
        info!("{}={}", name, value);
        self.update(|doc| {
            doc.outputs.insert(name.to_string(), value.to_string());
        })
    }

    fn export_variable(&self, name: &str, value: &str) -> CacheResult<()> {
        self.update(|doc| {
            doc.env.insert(name.to_string(), value.to_string());
        })
    }
}

impl Host for FileHost {
    fn host_name(&self) -> &'static str {
        "state file"
    }
}

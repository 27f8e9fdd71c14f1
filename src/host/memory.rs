//! In-memory host, used as a test double

use super::{Host, OutputSink, StateStore};
use crate::error::CacheResult;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<HashMap<String, String>>,
    outputs: Mutex<HashMap<String, String>>,
    env: Mutex<HashMap<String, String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, name: &str) -> Option<String> {
        lookup(&self.state, name)
    }

    pub fn output(&self, name: &str) -> Option<String> {
        lookup(&self.outputs, name)
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        lookup(&self.env, name)
    }
}

fn lookup(map: &Mutex<HashMap<String, String>>, name: &str) -> Option<String> {
    map.lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

fn insert(map: &Mutex<HashMap<String, String>>, name: &str, value: &str) {
    map.lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.to_string(), value.to_string());
}

impl StateStore for MemoryHost {
    fn save_state(&self, name: &str, value: &str) -> CacheResult<()> {
        insert(&self.state, name, value);
        Ok(())
    }

    fn read_state(&self, name: &str) -> CacheResult<Option<String>> {
        Ok(self.state(name).filter(|v| !v.is_empty()))
    }
}

impl OutputSink for MemoryHost {
    fn set_output(&self, name: &str, value: &str) -> CacheResult<()> {
        insert(&self.outputs, name, value);
        Ok(())
    }

    fn export_variable(&self, name: &str, value: &str) -> CacheResult<()> {
        insert(&self.env, name, value);
        Ok(())
    }
}

impl Host for MemoryHost {
    fn host_name(&self) -> &'static str {
        "memory"
    }
}

//! Blob store abstraction
//!
//! The cache archive primitive is an opaque key-value store keyed by string.
//! Lookups take a primary key plus fallback prefixes and return the key that
//! actually matched.

mod directory;

pub use directory::{expand_home, DirectoryStore, MAX_KEY_LENGTH};

use crate::config::Config;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Failures reported by a blob store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request itself is malformed (bad key, no paths)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another job already created, or is creating, an entry for this key
    #[error("{0}")]
    ReserveCache(String),

    /// Anything else: IO, timeouts, transient backend failures
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_reserve_conflict(&self) -> bool {
        matches!(self, Self::ReserveCache(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract archive storage
///
/// Paths are the user-facing storage paths (`~` allowed), keys are opaque.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Restore `paths` from the first entry matching `primary_key` or one of
    /// `fallback_keys`, tried in order. Returns the matched key.
    async fn restore(
        &self,
        paths: &[String],
        primary_key: &str,
        fallback_keys: &[String],
    ) -> StoreResult<Option<String>>;

    /// Save `paths` under `key`
    async fn save(&self, paths: &[String], key: &str) -> StoreResult<()>;

    /// Human-readable backend name for logs
    fn store_name(&self) -> &'static str;
}

/// Create the blob store configured for this run
pub fn create_store(config: &Config) -> Box<dyn BlobStore> {
    let store = DirectoryStore::new(config.store.dir());
    debug!("Store directory: {}", store.root().display());
    Box::new(store)
}

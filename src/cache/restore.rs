//! Restore phase
//!
//! Looks up the primary key and fallbacks in the blob store, classifies what
//! came back, and records `{paths, primary key, restored key}` for the save
//! phase. Store failures never fail the build: they are logged and the
//! restore counts as a miss.

use super::ecosystem::StateNames;
use super::key::CacheKey;
use crate::error::{CacheError, CacheResult};
use crate::host::{OutputSink, StateStore};
use crate::store::BlobStore;
use tracing::{info, warn};

/// What a restore found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing matched
    Miss,
    /// The primary key itself was restored
    ExactHit(String),
    /// A fallback prefix matched some other entry
    FallbackHit(String),
}

impl RestoreOutcome {
    pub fn classify(primary_key: &str, restored_key: Option<String>) -> Self {
        match restored_key {
            None => Self::Miss,
            Some(key) if key == primary_key => Self::ExactHit(key),
            Some(key) => Self::FallbackHit(key),
        }
    }

    pub fn restored_key(&self) -> Option<&str> {
        match self {
            Self::Miss => None,
            Self::ExactHit(key) | Self::FallbackHit(key) => Some(key),
        }
    }

    pub fn is_exact_hit(&self) -> bool {
        matches!(self, Self::ExactHit(_))
    }
}

/// Restore state of one cache, as handed to the save phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosystemState {
    pub paths: Vec<String>,
    pub primary_key: String,
    pub restored_key: Option<String>,
}

impl EcosystemState {
    /// Load the state recorded for `id`, or `None` if it was never restored
    pub fn load<S: StateStore + ?Sized>(state: &S, id: &str) -> CacheResult<Option<Self>> {
        let names = StateNames::for_id(id);
        let Some(primary_key) = state.read_state(&names.key)? else {
            return Ok(None);
        };

        let raw_paths = state
            .read_state(&names.paths)?
            .ok_or_else(|| CacheError::State(format!("{} is missing", names.paths)))?;
        let paths: Vec<String> = serde_json::from_str(&raw_paths)?;

        Ok(Some(Self {
            paths,
            primary_key,
            restored_key: state.read_state(&names.result)?,
        }))
    }

    /// Whether the restore was an exact hit on the primary key
    pub fn is_exact_hit(&self) -> bool {
        self.restored_key.as_deref() == Some(self.primary_key.as_str())
    }
}

/// Runs the restore phase for one cache at a time
pub struct RestoreCoordinator<'a, H: StateStore + OutputSink + ?Sized> {
    store: &'a dyn BlobStore,
    host: &'a H,
}

impl<'a, H: StateStore + OutputSink + ?Sized> RestoreCoordinator<'a, H> {
    pub fn new(store: &'a dyn BlobStore, host: &'a H) -> Self {
        Self { store, host }
    }

    pub async fn restore(
        &self,
        id: &str,
        paths: &[String],
        key: &CacheKey,
    ) -> CacheResult<RestoreOutcome> {
        let names = StateNames::for_id(id);

        // Recorded up front so the save phase still runs after a store outage
        self.host
            .save_state(&names.paths, &serde_json::to_string(paths)?)?;
        self.host.save_state(&names.key, &key.primary)?;

        info!(
            "Restoring {} cache using keys: {}",
            id,
            key.candidates().collect::<Vec<_>>().join(", ")
        );

        let restored = match self
            .store
            .restore(paths, &key.primary, &key.fallbacks)
            .await
        {
            Ok(restored) => restored,
            Err(e) => {
                warn!("Failed to restore {} cache: {}", id, e);
                None
            }
        };

        let outcome = RestoreOutcome::classify(&key.primary, restored);
        match &outcome {
            RestoreOutcome::Miss => info!("{} cache not found", id),
            RestoreOutcome::ExactHit(restored) => {
                info!("{} cache restored from key {}", id, restored)
            }
            RestoreOutcome::FallbackHit(restored) => info!(
                "{} cache restored from fallback key {} (primary key {})",
                id, restored, key.primary
            ),
        }

        self.host
            .save_state(&names.result, outcome.restored_key().unwrap_or_default())?;
        self.host.set_output(
            &format!("cache-hit-{id}"),
            if outcome.is_exact_hit() { "true" } else { "false" },
        )?;

        Ok(outcome)
    }
}

//! Save phase
//!
//! Saves a cache under its primary key unless the restore already hit that
//! key exactly. Store failures are triaged: a malformed request is returned
//! as an error, a reservation conflict (another job saved this key first) is
//! informational, anything else is a warning.

use super::restore::EcosystemState;
use crate::error::CacheResult;
use crate::host::StateStore;
use crate::store::BlobStore;
use tracing::{debug, info, warn};

/// What a save did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The cache was never restored in this job
    NotRestored,
    /// The restore hit the primary key exactly
    SkippedExactHit,
    Saved,
    /// Another job already saved this key
    AlreadyReserved,
    /// The store failed; the build carries on
    Failed(String),
}

/// Runs the save phase for one cache at a time
pub struct SaveCoordinator<'a, S: StateStore + ?Sized> {
    store: &'a dyn BlobStore,
    state: &'a S,
}

impl<'a, S: StateStore + ?Sized> SaveCoordinator<'a, S> {
    pub fn new(store: &'a dyn BlobStore, state: &'a S) -> Self {
        Self { store, state }
    }

    pub async fn save(&self, id: &str) -> CacheResult<SaveOutcome> {
        let Some(state) = EcosystemState::load(self.state, id)? else {
            debug!("No {} cache was restored, nothing to save", id);
            return Ok(SaveOutcome::NotRestored);
        };

        if state.is_exact_hit() {
            info!(
                "Cache hit occurred on the primary key {}, not saving {} cache.",
                state.primary_key, id
            );
            return Ok(SaveOutcome::SkippedExactHit);
        }

        match self.store.save(&state.paths, &state.primary_key).await {
            Ok(()) => {
                info!("{} cache saved with key {}", id, state.primary_key);
                Ok(SaveOutcome::Saved)
            }
            Err(e) if e.is_validation() => Err(e.into()),
            Err(e) if e.is_reserve_conflict() => {
                info!("{}", e);
                Ok(SaveOutcome::AlreadyReserved)
            }
            Err(e) => {
                warn!("Failed to save {} cache: {}", id, e);
                Ok(SaveOutcome::Failed(e.to_string()))
            }
        }
    }
}

//! Save command - save every restored cache after the build
//!
//! Never fails the build. Each cache is saved independently and any error is
//! logged before moving on to the next one.

use crate::cache::{Ecosystem, SaveCoordinator, SaveOutcome};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::host::{create_host, StateStore};
use crate::store::{create_store, BlobStore};
use tracing::{debug, error, info};

/// Result of saving every ecosystem
#[derive(Debug, Default)]
pub struct SaveSummary {
    pub outcomes: Vec<(Ecosystem, SaveOutcome)>,
    pub errors: Vec<(Ecosystem, CacheError)>,
}

impl SaveSummary {
    pub fn saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == SaveOutcome::Saved)
            .count()
    }
}

/// Execute the save command
pub async fn execute(config: &Config) -> CacheResult<()> {
    let host = create_host(config)?;
    let store = create_store(config);
    debug!("Using {} store", store.store_name());

    let summary = save_all(&*store, &*host).await;
    info!("{} cache(s) saved", summary.saved());
    if !summary.errors.is_empty() {
        error!("{} cache(s) could not be saved", summary.errors.len());
    }
    Ok(())
}

/// Save every ecosystem that was restored in this job
pub async fn save_all<S>(store: &dyn BlobStore, state: &S) -> SaveSummary
where
    S: StateStore + ?Sized,
{
    let coordinator = SaveCoordinator::new(store, state);
    let mut summary = SaveSummary::default();

    for ecosystem in Ecosystem::all() {
        match coordinator.save(ecosystem.id()).await {
            Ok(outcome) => summary.outcomes.push((*ecosystem, outcome)),
            Err(e) => {
                error!("Failed to save {} cache: {}", ecosystem, e);
                summary.errors.push((*ecosystem, e));
            }
        }
    }
    summary
}

//! Cache key derivation and the restore/save decision engine
//!
//! # Flow
//!
//! | Phase | Step |
//! |-------|------|
//! | restore | resolve inputs, build key, query store, persist state |
//! | save | read state, skip on exact hit, otherwise save under primary key |
//!
//! # Restore outcomes
//!
//! | Outcome | Store returned | Save phase |
//! |---------|----------------|------------|
//! | ExactHit | the primary key | skipped |
//! | FallbackHit | some other key | saves |
//! | Miss | nothing | saves |

pub mod ecosystem;
pub mod hasher;
pub mod inputs;
pub mod key;
pub mod restore;
pub mod save;

pub use ecosystem::{Ecosystem, StateNames};
pub use hasher::ContentHasher;
pub use inputs::{EcosystemInputs, GlobResolver, InputPlan};
pub use key::{CacheKey, KeyBuilder, KeyComponents, KeyContext, MatrixSignature, KEY_SEPARATOR};
pub use restore::{EcosystemState, RestoreCoordinator, RestoreOutcome};
pub use save::{SaveCoordinator, SaveOutcome};

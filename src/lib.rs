//! coursier-cache - Dependency cache orchestration for JVM builds
//!
//! Derives layered cache keys from a project's build definition and drives
//! the restore and save phases of the Coursier, sbt, Mill and Ammonite
//! caches on a CI runner.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod probe;
pub mod store;

pub use error::{CacheError, CacheResult};

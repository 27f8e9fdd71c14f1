//! Cache key construction
//!
//! A key is built from layered segments in a fixed order:
//!
//! ```text
//! <ecosystem>-<job>-matrix-<hash>-<shared extra key>-<extra key>-<content hash>
//! ```
//!
//! Absent segments are skipped entirely. Every present segment also records
//! the key as it stood before the segment was added (with a trailing
//! separator) as a fallback prefix, so a restore can fall back to the closest
//! previous cache: same job and matrix but older build files, then same job,
//! and finally anything for the ecosystem.

use super::hasher::ContentHasher;
use crate::error::CacheResult;
use std::path::PathBuf;
use tracing::debug;

/// Separator between key segments
pub const KEY_SEPARATOR: &str = "-";

/// Matrix context of the current job
///
/// Kept distinct from a plain optional string because CI hosts serialize a
/// job without a matrix in several ways (`null`, `{}`, `undefined`); those
/// all land on `Empty` rather than being hashed as if they were a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MatrixSignature {
    /// No matrix value was supplied at all
    #[default]
    NotProvided,
    /// A value was supplied but denotes "no matrix"
    Empty,
    /// A real matrix signature, hashed into the key
    Signature(String),
}

impl MatrixSignature {
    /// Interpret a raw matrix value as handed over by the CI host
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::NotProvided;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::NotProvided;
        }

        if trimmed == "undefined" {
            debug!("Matrix value `undefined` treated as no matrix");
            return Self::Empty;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Null) => {
                debug!("Matrix value `null` treated as no matrix");
                Self::Empty
            }
            Ok(serde_json::Value::Object(map)) if map.is_empty() => {
                debug!("Empty matrix object treated as no matrix");
                Self::Empty
            }
            _ => Self::Signature(trimmed.to_string()),
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::Signature(s) => Some(s),
            Self::NotProvided | Self::Empty => None,
        }
    }
}

/// Context shared by every ecosystem's key in one run
#[derive(Debug, Clone, Default)]
pub struct KeyContext {
    pub job: Option<String>,
    pub matrix: MatrixSignature,
    pub shared_extra_key: Option<String>,
}

/// Segments for one ecosystem's key
#[derive(Debug, Clone)]
pub struct KeyComponents<'a> {
    pub ecosystem_id: &'a str,
    pub context: &'a KeyContext,
    pub extra_key: Option<&'a str>,
    pub input_files: &'a [PathBuf],
    pub extra_hashed_content: &'a str,
}

/// A primary key and its fallback prefixes, most specific first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl CacheKey {
    /// Primary key followed by every fallback, in restore trial order
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

fn present(segment: Option<&str>) -> Option<&str> {
    segment.filter(|s| !s.is_empty())
}

/// Builds cache keys with one content hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBuilder {
    hasher: ContentHasher,
}

impl KeyBuilder {
    pub fn new(hasher: ContentHasher) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    pub fn build(&self, components: &KeyComponents<'_>) -> CacheResult<CacheKey> {
        let mut key = components.ecosystem_id.to_string();
        let mut fallbacks = Vec::new();

        let mut extend = |key: &mut String, segment: &str| {
            fallbacks.push(format!("{key}{KEY_SEPARATOR}"));
            key.push_str(KEY_SEPARATOR);
            key.push_str(segment);
        };

        let context = components.context;
        if let Some(job) = present(context.job.as_deref()) {
            extend(&mut key, job);
        }
        if let Some(signature) = present(context.matrix.signature()) {
            let empty: [PathBuf; 0] = [];
            let matrix_hash = self.hasher.digest(&empty, signature)?;
            extend(&mut key, &format!("matrix-{matrix_hash}"));
        }
        if let Some(shared) = present(context.shared_extra_key.as_deref()) {
            extend(&mut key, shared);
        }
        if let Some(extra) = present(components.extra_key) {
            extend(&mut key, extra);
        }
        if !components.input_files.is_empty() || !components.extra_hashed_content.is_empty() {
            let content_hash = self
                .hasher
                .digest(components.input_files, components.extra_hashed_content)?;
            extend(&mut key, &content_hash);
        }

        fallbacks.reverse();
        Ok(CacheKey {
            primary: key,
            fallbacks,
        })
    }
}

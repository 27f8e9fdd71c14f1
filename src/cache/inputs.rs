//! Build-definition inputs for every ecosystem
//!
//! Expands each ecosystem's characteristic globs under the project root,
//! decides which ecosystems are present, and assembles the extra hashed
//! content each key folds in.

use super::ecosystem::Ecosystem;
use crate::config::schema::EcosystemConfig;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands path patterns to regular files
#[derive(Debug, Clone)]
pub struct GlobResolver {
    root: String,
}

impl GlobResolver {
    pub fn new(root: &Path) -> Self {
        let mut root = root.to_string_lossy().into_owned();
        if root.is_empty() {
            root.push('.');
        }
        if !root.ends_with('/') {
            root.push('/');
        }
        Self { root }
    }

    /// Pattern relative to the project root
    pub fn rooted(&self, relative: &str) -> String {
        format!("{}{}", self.root, relative)
    }

    /// Every regular file matched by any of `patterns`, sorted, without
    /// duplicates
    pub fn resolve(&self, patterns: &[String]) -> CacheResult<Vec<PathBuf>> {
        let mut files = BTreeSet::new();
        for pattern in patterns.iter().filter(|p| !p.trim().is_empty()) {
            let paths = glob::glob(pattern).map_err(|e| CacheError::GlobPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })?;
            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        files.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Skipping unreadable glob match for {}: {}", pattern, e),
                }
            }
        }
        Ok(files.into_iter().collect())
    }
}

/// Extra hashed content, serialized as a JSON object naming its source
#[derive(Debug, Default, Serialize)]
struct HashedContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sbt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mill: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amm: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    other: Option<&'a str>,
}

/// Resolved inputs for one ecosystem
#[derive(Debug, Clone)]
pub struct EcosystemInputs {
    pub ecosystem: Ecosystem,
    /// Whether the ecosystem's characteristic files exist
    pub detected: bool,
    pub files: Vec<PathBuf>,
    pub extra_hashed_content: String,
}

/// Inputs for every ecosystem, in restore order
#[derive(Debug, Clone)]
pub struct InputPlan {
    entries: Vec<EcosystemInputs>,
}

impl InputPlan {
    pub fn discover(resolver: &GlobResolver, config: &Config) -> CacheResult<Self> {
        let with_extras = |base: &[&str], eco: &EcosystemConfig| -> Vec<String> {
            base.iter()
                .map(|p| resolver.rooted(p))
                .chain(eco.extra_files.iter().cloned())
                .collect()
        };

        let sbt_globs = with_extras(
            &[
                "*.sbt",
                "project/**/*.sbt",
                "project/build.properties",
                "project/**/*.scala",
            ],
            &config.sbt,
        );
        let mill_specific_globs = with_extras(&[".mill-version", "mill"], &config.mill);
        let mill_globs: Vec<String> = std::iter::once(resolver.rooted("*.sc"))
            .chain(mill_specific_globs.iter().cloned())
            .collect();
        let ammonite_globs = with_extras(&["*.sc", "*/*.sc"], &config.ammonite);
        let coursier_globs: Vec<String> = sbt_globs
            .iter()
            .chain(&mill_globs)
            .chain(&ammonite_globs)
            .chain(&config.coursier.extra_files)
            .cloned()
            .collect();

        let sbt_content = config.sbt.extra_hashed_content.as_str();
        let mill_content = config.mill.extra_hashed_content.as_str();
        let amm_content = config.ammonite.extra_hashed_content.as_str();
        let other_content = config.coursier.extra_hashed_content.as_str();

        let entries = vec![
            EcosystemInputs {
                ecosystem: Ecosystem::Coursier,
                detected: false,
                files: resolver.resolve(&coursier_globs)?,
                extra_hashed_content: serde_json::to_string(&HashedContent {
                    sbt: Some(sbt_content),
                    mill: Some(mill_content),
                    amm: Some(amm_content),
                    other: Some(other_content),
                })?,
            },
            EcosystemInputs {
                ecosystem: Ecosystem::Sbt,
                files: resolver.resolve(&sbt_globs)?,
                detected: false,
                extra_hashed_content: serde_json::to_string(&HashedContent {
                    sbt: Some(sbt_content),
                    ..Default::default()
                })?,
            },
            EcosystemInputs {
                ecosystem: Ecosystem::Mill,
                detected: !resolver.resolve(&mill_specific_globs)?.is_empty(),
                files: resolver.resolve(&mill_globs)?,
                extra_hashed_content: serde_json::to_string(&HashedContent {
                    mill: Some(mill_content),
                    ..Default::default()
                })?,
            },
            EcosystemInputs {
                ecosystem: Ecosystem::Ammonite,
                files: resolver.resolve(&ammonite_globs)?,
                detected: false,
                extra_hashed_content: serde_json::to_string(&HashedContent {
                    amm: Some(amm_content),
                    ..Default::default()
                })?,
            },
        ];

        let entries = entries
            .into_iter()
            .map(|mut inputs| {
                match inputs.ecosystem {
                    eco if eco.is_umbrella() => inputs.detected = true,
                    Ecosystem::Sbt | Ecosystem::Ammonite => inputs.detected = !inputs.files.is_empty(),
                    _ => {}
                }
                debug!(
                    "{}: {} input file(s), detected: {}",
                    inputs.ecosystem,
                    inputs.files.len(),
                    inputs.detected
                );
                inputs
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[EcosystemInputs] {
        &self.entries
    }

    pub fn get(&self, ecosystem: Ecosystem) -> Option<&EcosystemInputs> {
        self.entries.iter().find(|e| e.ecosystem == ecosystem)
    }
}

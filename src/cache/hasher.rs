//! Content hashing for cache keys
//!
//! A digest covers the bytes of a set of files plus an optional string of
//! extra content. The extra content is treated exactly like one more file
//! with that content, so no temporary file ever needs to be written.
//!
//! Each input is hashed on its own; the per-input digests are sorted before
//! being combined, so the order in which a glob lists files never changes
//! the result.

use crate::error::{CacheError, CacheResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Computes content digests. One hasher (one algorithm) serves every
/// ecosystem in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Digest the contents of `files`, mixed with `extra_content` when it is
    /// non-empty. Empty paths are ignored; a file listed twice counts once.
    ///
    /// Fails without producing a partial digest if any file is unreadable.
    pub fn digest<P: AsRef<Path>>(&self, files: &[P], extra_content: &str) -> CacheResult<String> {
        let unique: BTreeSet<PathBuf> = files
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect();

        let mut digests = Vec::with_capacity(unique.len() + 1);
        for path in &unique {
            let contents = fs::read(path)
                .map_err(|e| CacheError::io(format!("reading {}", path.display()), e))?;
            digests.push(Sha256::digest(&contents));
        }

        if !extra_content.is_empty() {
            digests.push(Sha256::digest(extra_content.as_bytes()));
        }

        digests.sort();

        let mut hasher = Sha256::new();
        for digest in &digests {
            hasher.update(digest);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn hash_deterministic() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "build.sbt", "x");

        let hasher = ContentHasher::new();
        let hash1 = hasher.digest(&[&file], "").unwrap();
        let hash2 = hasher.digest(&[&file], "").unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn order_independent() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "build.sbt", "a");
        let b = write(&dir, "plugins.sbt", "b");
        let c = write(&dir, "build.properties", "sbt.version=1.10.0");

        let hasher = ContentHasher::new();
        let forward = hasher.digest(&[&a, &b, &c], "").unwrap();
        let shuffled = hasher.digest(&[&c, &a, &b], "").unwrap();

        assert_eq!(forward, shuffled);
    }

    #[test]
    fn different_content_different_hash() {
        let dir = TempDir::new().unwrap();
        let one = write(&dir, "one.sc", "content 1");
        let two = write(&dir, "two.sc", "content 2");

        let hasher = ContentHasher::new();
        assert_ne!(
            hasher.digest(&[one], "").unwrap(),
            hasher.digest(&[two], "").unwrap()
        );
    }

    #[test]
    fn extra_content_changes_digest() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "build.sc", "object build");

        let hasher = ContentHasher::new();
        let plain = hasher.digest(&[&file], "").unwrap();
        let mixed = hasher.digest(&[&file], "jdk-21").unwrap();

        assert_ne!(plain, mixed);
    }

    #[test]
    fn extra_content_matches_materialized_file() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "build.sbt", "x");
        let synthetic = write(&dir, ".tmp-cs-cache-key", r#"{"sbt":""}"#);

        let hasher = ContentHasher::new();
        let in_memory = hasher.digest(&[&file], r#"{"sbt":""}"#).unwrap();
        let on_disk = hasher.digest(&[&file, &synthetic], "").unwrap();

        assert_eq!(in_memory, on_disk);
    }

    #[test]
    fn empty_paths_ignored() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "build.sbt", "x");

        let hasher = ContentHasher::new();
        let with_blank = hasher
            .digest(&[PathBuf::new(), file.clone(), PathBuf::from("")], "")
            .unwrap();
        assert_eq!(with_blank, hasher.digest(&[file], "").unwrap());
    }

    #[test]
    fn unreadable_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "build.sbt", "x");
        let missing = dir.path().join("missing.sbt");

        let err = ContentHasher::new().digest(&[file, missing], "").unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn empty_inputs_still_digest() {
        let hasher = ContentHasher::new();
        let empty: [PathBuf; 0] = [];
        let bare = hasher.digest(&empty, "").unwrap();
        let matrix = hasher.digest(&empty, r#"{"scala":"3"}"#).unwrap();

        assert_eq!(bare.len(), 64);
        assert_ne!(bare, matrix);
    }
}

//! Local directory blob store
//!
//! Each entry lives in its own directory under the store root:
//!
//! ```text
//! <root>/<sha256(key)>/manifest.json
//! <root>/<sha256(key)>/data/<n>/...     copy of the n-th cached path
//! ```
//!
//! Entries are immutable. A save stages into a private directory and renames
//! it into place, so two jobs racing on the same key see exactly one winner.

use super::{BlobStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys longer than this are rejected
pub const MAX_KEY_LENGTH: usize = 512;

const MANIFEST_FILE: &str = "manifest.json";
const DATA_DIR: &str = "data";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryManifest {
    key: String,
    paths: Vec<String>,
    created_at: DateTime<Utc>,
}

/// Blob store backed by a local (or mounted) directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(home) => home,
        None => return PathBuf::from(path),
    };

    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn entry_name(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::Validation("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::Validation(format!(
            "Key {key} cannot be larger than {MAX_KEY_LENGTH} characters."
        )));
    }
    if key.contains(',') {
        return Err(StoreError::Validation(format!(
            "Key {key} cannot contain commas."
        )));
    }
    Ok(())
}

fn validate_paths(paths: &[String]) -> StoreResult<()> {
    if paths.is_empty() || paths.iter().all(|p| p.trim().is_empty()) {
        return Err(StoreError::Validation(
            "At least one directory or file path is required".to_string(),
        ));
    }
    Ok(())
}

fn io_error(context: impl std::fmt::Display, err: std::io::Error) -> StoreError {
    StoreError::Other(format!("{context}: {err}"))
}

/// Copy a file or directory tree, merging into whatever already exists at `dst`
fn copy_tree(src: &Path, dst: &Path) -> StoreResult<()> {
    let meta = fs::metadata(src).map_err(|e| io_error(format!("reading {}", src.display()), e))?;

    if meta.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| io_error(format!("creating {}", parent.display()), e))?;
        }
        fs::copy(src, dst)
            .map_err(|e| io_error(format!("copying {} to {}", src.display(), dst.display()), e))?;
        return Ok(());
    }

    fs::create_dir_all(dst).map_err(|e| io_error(format!("creating {}", dst.display()), e))?;
    let entries =
        fs::read_dir(src).map_err(|e| io_error(format!("listing {}", src.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(format!("listing {}", src.display()), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| io_error(format!("inspecting {}", entry.path().display()), e))?;
        let target = dst.join(entry.file_name());

        // Symlinked directories are not followed
        if file_type.is_symlink() && entry.path().is_dir() {
            debug!("Skipping symlinked directory {}", entry.path().display());
            continue;
        }
        copy_tree(&entry.path(), &target)?;
    }
    Ok(())
}

fn read_manifests(root: &Path) -> StoreResult<Vec<(PathBuf, EntryManifest)>> {
    if !root.exists() {
        return Ok(vec![]);
    }

    let mut manifests = vec![];
    let entries =
        fs::read_dir(root).map_err(|e| io_error(format!("listing {}", root.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(format!("listing {}", root.display()), e))?;
        // In-flight saves
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let manifest_path = entry.path().join(MANIFEST_FILE);
        let Ok(content) = fs::read_to_string(&manifest_path) else {
            continue;
        };
        match serde_json::from_str::<EntryManifest>(&content) {
            Ok(manifest) => manifests.push((entry.path(), manifest)),
            Err(e) => debug!("Ignoring unreadable manifest {}: {}", manifest_path.display(), e),
        }
    }
    Ok(manifests)
}

fn restore_blocking(
    root: &Path,
    paths: &[String],
    candidates: &[String],
) -> StoreResult<Option<String>> {
    let entries: Vec<_> = read_manifests(root)?
        .into_iter()
        .filter(|(_, m)| m.paths == paths)
        .collect();

    for candidate in candidates {
        let found = entries
            .iter()
            .find(|(_, m)| m.key == *candidate)
            .or_else(|| {
                entries
                    .iter()
                    .filter(|(_, m)| m.key.starts_with(candidate.as_str()))
                    .max_by_key(|(_, m)| m.created_at)
            });

        if let Some((dir, manifest)) = found {
            debug!("Matched {} for candidate {}", manifest.key, candidate);
            for (index, path) in paths.iter().enumerate() {
                let src = dir.join(DATA_DIR).join(index.to_string());
                if src.exists() {
                    copy_tree(&src, &expand_home(path))?;
                }
            }
            return Ok(Some(manifest.key.clone()));
        }
    }

    Ok(None)
}

fn save_blocking(root: &Path, paths: &[String], key: &str) -> StoreResult<()> {
    let reserve_error = || {
        StoreError::ReserveCache(format!(
            "Unable to reserve cache with key {key}, another job may be creating this cache."
        ))
    };

    let name = entry_name(key);
    let entry_dir = root.join(&name);
    if entry_dir.exists() {
        return Err(reserve_error());
    }

    let sources: Vec<(usize, PathBuf)> = paths
        .iter()
        .enumerate()
        .map(|(index, path)| (index, expand_home(path)))
        .filter(|(_, path)| path.exists())
        .collect();
    if sources.is_empty() {
        return Err(StoreError::Other(
            "Path Validation Error: Path(s) specified for caching do not exist, hence no cache is being saved."
                .to_string(),
        ));
    }

    let staging = root.join(format!(".staging-{}-{}", name, std::process::id()));
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .map_err(|e| io_error(format!("clearing {}", staging.display()), e))?;
    }
    fs::create_dir_all(staging.join(DATA_DIR))
        .map_err(|e| io_error(format!("creating {}", staging.display()), e))?;

    let staged = stage_entry(&staging, &sources, paths, key).and_then(|()| {
        fs::rename(&staging, &entry_dir).map_err(|e| {
            if entry_dir.exists() {
                reserve_error()
            } else {
                io_error(format!("publishing {}", entry_dir.display()), e)
            }
        })
    });

    if staged.is_err() && staging.exists() {
        if let Err(e) = fs::remove_dir_all(&staging) {
            debug!("Failed to remove staging dir {}: {}", staging.display(), e);
        }
    }
    staged
}

fn stage_entry(
    staging: &Path,
    sources: &[(usize, PathBuf)],
    paths: &[String],
    key: &str,
) -> StoreResult<()> {
    for (index, source) in sources {
        copy_tree(source, &staging.join(DATA_DIR).join(index.to_string()))?;
    }

    let manifest = EntryManifest {
        key: key.to_string(),
        paths: paths.to_vec(),
        created_at: Utc::now(),
    };
    let content = serde_json::to_string_pretty(&manifest)
        .map_err(|e| StoreError::Other(format!("serializing manifest: {e}")))?;
    fs::write(staging.join(MANIFEST_FILE), content)
        .map_err(|e| io_error("writing manifest", e))
}

#[async_trait]
impl BlobStore for DirectoryStore {
    async fn restore(
        &self,
        paths: &[String],
        primary_key: &str,
        fallback_keys: &[String],
    ) -> StoreResult<Option<String>> {
        validate_paths(paths)?;
        let candidates: Vec<String> = std::iter::once(primary_key.to_string())
            .chain(fallback_keys.iter().cloned())
            .collect();
        for key in &candidates {
            validate_key(key)?;
        }

        let root = self.root.clone();
        let paths = paths.to_vec();
        tokio::task::spawn_blocking(move || restore_blocking(&root, &paths, &candidates))
            .await
            .map_err(|e| StoreError::Other(format!("restore task failed: {e}")))?
    }

    async fn save(&self, paths: &[String], key: &str) -> StoreResult<()> {
        validate_paths(paths)?;
        validate_key(key)?;

        let root = self.root.clone();
        let paths = paths.to_vec();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || save_blocking(&root, &paths, &key))
            .await
            .map_err(|e| StoreError::Other(format!("save task failed: {e}")))?
    }

    fn store_name(&self) -> &'static str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_dir(temp: &TempDir, contents: &str) -> String {
        let dir = temp.path().join("cache");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("artifact.jar"), contents).unwrap();
        dir.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn save_then_restore_exact() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "v1");

        store.save(&[path.clone()], "coursier-abc").await.unwrap();
        fs::remove_dir_all(&path).unwrap();

        let hit = store
            .restore(&[path.clone()], "coursier-abc", &["coursier-".to_string()])
            .await
            .unwrap();

        assert_eq!(hit.as_deref(), Some("coursier-abc"));
        let restored = fs::read_to_string(Path::new(&path).join("nested/artifact.jar")).unwrap();
        assert_eq!(restored, "v1");
    }

    #[tokio::test]
    async fn newest_prefix_match_wins() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "a");
        store.save(&[path.clone()], "coursier-a").await.unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let path = cache_dir(&temp, "b");
        store.save(&[path.clone()], "coursier-b").await.unwrap();
        fs::remove_dir_all(&path).unwrap();

        let hit = store
            .restore(&[path.clone()], "coursier-c", &["coursier-".to_string()])
            .await
            .unwrap();

        assert_eq!(hit.as_deref(), Some("coursier-b"));
        let restored = fs::read_to_string(Path::new(&path).join("nested/artifact.jar")).unwrap();
        assert_eq!(restored, "b");
        assert_eq!(read_manifests(store.root()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restore_falls_back_to_prefix() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "old");

        store.save(&[path.clone()], "coursier-old").await.unwrap();

        let hit = store
            .restore(&[path], "coursier-new", &["coursier-".to_string()])
            .await
            .unwrap();
        assert_eq!(hit.as_deref(), Some("coursier-old"));
    }

    #[tokio::test]
    async fn restore_miss_on_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("missing"));
        let path = cache_dir(&temp, "x");

        let hit = store.restore(&[path], "mill-abc", &[]).await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn restore_ignores_entries_for_other_paths() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "x");

        store.save(&[path], "mill-abc").await.unwrap();

        let other = temp.path().join("other").to_string_lossy().into_owned();
        let hit = store.restore(&[other], "mill-abc", &[]).await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn second_save_is_reserve_conflict() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "x");

        store.save(&[path.clone()], "sbt-abc").await.unwrap();
        let err = store.save(&[path], "sbt-abc").await.unwrap_err();
        assert!(err.is_reserve_conflict());
    }

    #[tokio::test]
    async fn save_rejects_malformed_requests() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let path = cache_dir(&temp, "x");

        let err = store.save(&[], "sbt-abc").await.unwrap_err();
        assert!(err.is_validation());

        let err = store.save(&[path.clone()], "sbt,abc").await.unwrap_err();
        assert!(err.is_validation());

        let long_key = "k".repeat(MAX_KEY_LENGTH + 1);
        let err = store.save(&[path], &long_key).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn save_of_missing_paths_is_not_validation() {
        let temp = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp.path().join("store"));
        let missing = temp.path().join("nope").to_string_lossy().into_owned();

        let err = store.save(&[missing], "sbt-abc").await.unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("rel/~/x"), PathBuf::from("rel/~/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ivy2/cache"), home.join(".ivy2/cache"));
            assert_eq!(expand_home("~"), home);
        }
    }
}

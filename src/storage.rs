//! Storage layout for tally
//!
//! All state lives under a single data root (default: the platform data
//! directory for "tally", overridable via config or `--data-dir`):
//!
//! ```text
//! <data_root>/
//!   owner                 # persisted current owner name
//!   owners/
//!     <owner>/
//!       tasks.json        # array of task records
//!       seq.json          # per-owner sequence counter, {"last": N}
//!       store.lock        # flock target for mutations
//! ```
//!
//! Writes go through the atomic temp-file-then-rename pattern so a store
//! file is either fully written or untouched.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Directory holding one subdirectory per owner
pub const OWNERS_DIR: &str = "owners";

/// Task records for one owner
pub const TASKS_FILE: &str = "tasks.json";

/// Per-owner sequence counter
pub const SEQ_FILE: &str = "seq.json";

/// Lock file guarding an owner's store
pub const LOCK_FILE: &str = "store.lock";

/// Persisted current-owner name
pub const OWNER_FILE: &str = "owner";

/// Path manager for the tally data root
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Platform default data root, e.g. `~/.local/share/tally` on Linux.
    pub fn default_root() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "tally").ok_or_else(|| {
            Error::OperationFailed("could not determine a data directory".to_string())
        })?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn owners_dir(&self) -> PathBuf {
        self.root.join(OWNERS_DIR)
    }

    pub fn owner_dir(&self, owner: &str) -> PathBuf {
        self.owners_dir().join(owner)
    }

    pub fn tasks_file(&self, owner: &str) -> PathBuf {
        self.owner_dir(owner).join(TASKS_FILE)
    }

    pub fn seq_file(&self, owner: &str) -> PathBuf {
        self.owner_dir(owner).join(SEQ_FILE)
    }

    pub fn lock_file(&self, owner: &str) -> PathBuf {
        self.owner_dir(owner).join(LOCK_FILE)
    }

    pub fn owner_file(&self) -> PathBuf {
        self.root.join(OWNER_FILE)
    }

    /// Owners that currently have a store directory, sorted.
    pub fn list_owners(&self) -> Result<Vec<String>> {
        let dir = self.owners_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut owners = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                owners.push(name.to_string());
            }
        }
        owners.sort();
        Ok(owners)
    }

    /// Read and deserialize a JSON file, `Ok(None)` if it does not exist.
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&raw)?;
        Ok(Some(value))
    }

    /// Serialize and write a JSON file atomically (temp file + rename).
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        write_atomic(path, &data)
    }
}

/// Atomically replace `path` with `data`.
///
/// The temp file is created in the same directory so the final rename
/// stays on one filesystem.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(format!(
        "{}.tmp.{}",
        path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        std::process::id()
    ));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths_nest_under_owner_dir() {
        let storage = Storage::new(PathBuf::from("/data"));
        assert_eq!(
            storage.tasks_file("alice"),
            PathBuf::from("/data/owners/alice/tasks.json")
        );
        assert_eq!(
            storage.seq_file("alice"),
            PathBuf::from("/data/owners/alice/seq.json")
        );
        assert_eq!(
            storage.lock_file("alice"),
            PathBuf::from("/data/owners/alice/store.lock")
        );
        assert_eq!(storage.owner_file(), PathBuf::from("/data/owner"));
    }

    #[test]
    fn read_json_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let value: Option<Vec<u32>> = storage
            .read_json(&dir.path().join("missing.json"))
            .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let path = dir.path().join("nested").join("data.json");

        storage.write_json(&path, &vec![1u32, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = storage.read_json(&path).unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));

        storage.write_json(&path, &vec![4u32]).unwrap();
        let value: Option<Vec<u32>> = storage.read_json(&path).unwrap();
        assert_eq!(value, Some(vec![4]));
    }

    #[test]
    fn list_owners_sorted() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        fs::create_dir_all(storage.owner_dir("bob")).unwrap();
        fs::create_dir_all(storage.owner_dir("alice")).unwrap();

        assert_eq!(storage.list_owners().unwrap(), vec!["alice", "bob"]);
    }
}

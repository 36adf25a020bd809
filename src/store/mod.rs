//! File-backed key-value store.
//!
//! One JSON document on disk maps string keys to JSON values. All
//! operations are synchronous and local to one process; every mutation
//! rewrites the whole file. This is a deliberate constraint carried over
//! from the data scale this service targets: a handful of users and maps,
//! a single writer. Malformed persisted data never reaches callers; the
//! store logs a warning and behaves as if the data were absent.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Store keys. One logical table or scratch value per key.
pub mod keys {
    /// Full user list.
    pub const USERS: &str = "users";
    /// Token-indexed session table.
    pub const SESSIONS: &str = "sessions";
    /// Full map-document list.
    pub const MAPS: &str = "maps";
    /// In-progress state selection.
    pub const DRAFT_STATES: &str = "draft.states";
    /// In-progress map title.
    pub const DRAFT_TITLE: &str = "draft.title";
    /// In-progress visibility flag.
    pub const DRAFT_IS_PUBLIC: &str = "draft.is_public";
}

pub struct KvStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl KvStore {
    /// Open the store file at `path`. A missing file is an empty store; a
    /// file that exists but does not parse is also an empty store; the
    /// parse error is logged and the first write replaces the file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Store file is unreadable, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No store file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Read the raw JSON value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Read and decode the value stored under `key`. A present but
    /// malformed value behaves as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, error = %e, "Stored value is malformed, treating as absent");
                None
            }
        }
    }

    /// Store `value` under `key` and rewrite the file.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    /// Remove `key`. Removing an absent key is a no-op and does not touch
    /// the file.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Decode the value under `key` (or its default), run `mutate` on it,
    /// and write the result back, all under one write lock, so no other
    /// read-modify-write in this process can interleave.
    pub fn update<T, R>(&self, key: &str, mutate: impl FnOnce(&mut T) -> R) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let mut entries = self.entries.write();
        let mut current: T = match entries.get(key) {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(key, error = %e, "Stored value is malformed, treating as absent");
                    T::default()
                }
            },
            None => T::default(),
        };

        let out = mutate(&mut current);
        entries.insert(key.to_string(), serde_json::to_value(&current)?);
        self.persist(&entries)?;
        Ok(out)
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, KvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("store.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, store) = temp_store();
        store.set("greeting", &"hello").unwrap();
        assert_eq!(store.get_as::<String>("greeting").unwrap(), "hello");

        store.remove("greeting").unwrap();
        assert!(store.get("greeting").is_none());

        // Removing again is a no-op
        store.remove("greeting").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = KvStore::open(&path).unwrap();
        store.set("numbers", &vec![1, 2, 3]).unwrap();
        drop(store);

        let reopened = KvStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_as::<Vec<i32>>("numbers").unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let store = KvStore::open(&path).unwrap();
        assert!(store.get("users").is_none());

        // First write replaces the broken file
        store.set("users", &Vec::<String>::new()).unwrap();
        drop(store);
        let reopened = KvStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_as::<Vec<String>>("users").unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_malformed_value_behaves_as_absent() {
        let (_dir, store) = temp_store();
        store.set("count", &"not a number").unwrap();
        assert!(store.get_as::<u64>("count").is_none());
        // The raw value is still there
        assert!(store.get("count").is_some());
    }

    #[test]
    fn test_update_reads_default_when_absent() {
        let (_dir, store) = temp_store();
        let len = store
            .update("list", |items: &mut Vec<String>| {
                items.push("first".to_string());
                items.len()
            })
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(
            store.get_as::<Vec<String>>("list").unwrap(),
            vec!["first".to_string()]
        );
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Flat-file JSON collection store.
//!
//! Each collection is one JSON array on disk, mutated read-modify-write as a
//! whole. Writes go to a temp file first and are renamed into place, so a
//! crash never leaves a truncated collection. A corrupt file is logged and
//! reset to empty rather than failing the caller.
//!
//! Every collection has its own async mutex owned by the store. Callers take
//! a [`CollectionGuard`] for the full read-modify-write sequence, which
//! serializes concurrent mutations and closes the lost-update race of the
//! legacy implementation. Where two collections are touched in one operation
//! the lock order is transactions before users.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use super::paths::{Collection, StoragePaths};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Flat-file store holding the per-collection locks.
#[derive(Debug)]
pub struct JsonStore {
    paths: StoragePaths,
    users_lock: Mutex<()>,
    sessions_lock: Mutex<()>,
    transactions_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            users_lock: Mutex::new(()),
            sessions_lock: Mutex::new(()),
            transactions_lock: Mutex::new(()),
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the data root and outbox directory. Safe to call repeatedly.
    pub fn initialize(&self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.root())?;
        fs::create_dir_all(self.paths.outbox_dir())?;
        Ok(())
    }

    /// Write-read-delete probe to verify the data directory is usable.
    pub fn health_check(&self) -> StorageResult<()> {
        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::Io(std::io::Error::other(
                "health check data mismatch",
            )));
        }
        Ok(())
    }

    /// Acquire the lock for a collection. Held until the guard drops; all
    /// read-modify-write sequences on the collection must run under it.
    pub async fn collection(&self, collection: Collection) -> CollectionGuard<'_> {
        let guard = match collection {
            Collection::Users => self.users_lock.lock().await,
            Collection::Sessions => self.sessions_lock.lock().await,
            Collection::Transactions => self.transactions_lock.lock().await,
        };
        CollectionGuard {
            _guard: guard,
            path: self.paths.collection_file(collection),
        }
    }
}

/// Exclusive handle on one collection's backing file.
pub struct CollectionGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    path: PathBuf,
}

impl CollectionGuard<'_> {
    /// Read the full collection. A missing file is an empty collection; a
    /// corrupt file is reset to empty with a warning, which is why `T` also
    /// needs `Serialize`.
    pub fn read<T: DeserializeOwned + Serialize>(&self) -> StorageResult<Vec<T>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corrupt collection file, resetting to empty"
                );
                self.write::<T>(&[])?;
                Ok(Vec::new())
            }
        }
    }

    /// Replace the full collection atomically (temp file + rename).
    pub fn write<T: Serialize>(&self, records: &[T]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (Arc<JsonStore>, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (Arc::new(store), dir)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: String,
        value: i64,
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let (store, _dir) = test_store();
        let guard = store.collection(Collection::Users).await;
        let records: Vec<TestRecord> = guard.read().unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn write_and_read_roundtrip() {
        let (store, _dir) = test_store();
        let guard = store.collection(Collection::Users).await;

        let records = vec![
            TestRecord {
                id: "a".into(),
                value: 1,
            },
            TestRecord {
                id: "b".into(),
                value: 2,
            },
        ];
        guard.write(&records).unwrap();

        let read: Vec<TestRecord> = guard.read().unwrap();
        assert_eq!(read, records);
    }

    #[tokio::test]
    async fn corrupt_file_resets_to_empty() {
        let (store, _dir) = test_store();
        let path = store.paths().collection_file(Collection::Sessions);
        fs::write(&path, b"{not json").unwrap();

        let guard = store.collection(Collection::Sessions).await;
        let records: Vec<TestRecord> = guard.read().unwrap();
        assert!(records.is_empty());

        // The file was rewritten as a valid empty collection.
        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<TestRecord> = serde_json::from_str(&raw).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let (store, _dir) = test_store();
        let guard = store.collection(Collection::Transactions).await;
        guard
            .write(&[TestRecord {
                id: "t".into(),
                value: 9,
            }])
            .unwrap();

        let tmp = store
            .paths()
            .collection_file(Collection::Transactions)
            .with_extension("json.tmp");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn concurrent_mutations_do_not_lose_updates() {
        let (store, _dir) = test_store();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let guard = store.collection(Collection::Users).await;
                let mut records: Vec<TestRecord> = guard.read().unwrap();
                records.push(TestRecord {
                    id: format!("r{i}"),
                    value: i,
                });
                guard.write(&records).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let guard = store.collection(Collection::Users).await;
        let records: Vec<TestRecord> = guard.read().unwrap();
        assert_eq!(records.len(), 20);
    }

    #[tokio::test]
    async fn health_check_works() {
        let (store, _dir) = test_store();
        store.health_check().expect("health check should pass");
    }
}

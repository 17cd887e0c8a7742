//! JSON snapshot persistence
//!
//! A snapshot is a JSON array of signature records, one file per namespace.
//! Writers serialize on an exclusive lock over `<namespace>.json.lock` and
//! merge with whatever is already on disk, so concurrent processes never drop
//! each other's records.

use fs4::fs_std::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use stacksfort_common::SignatureRecord;

use super::{InMemorySignatureStore, SignatureStore};
use crate::config::snapshot_path;
use crate::error::StoreError;

/// Snapshot file for one namespace
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/<namespace>.json`
    pub fn for_namespace(data_dir: &Path, namespace: &str) -> Self {
        Self::new(snapshot_path(data_dir, namespace))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. A missing file is an empty snapshot; an unreadable
    /// one is an error.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<SignatureRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let records: Vec<SignatureRecord> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(count = records.len(), "Snapshot loaded");
        Ok(records)
    }

    /// Load straight into a fresh store
    pub async fn load_store(&self, namespace: &str) -> Result<InMemorySignatureStore, StoreError> {
        let records = self.load().await?;
        Ok(InMemorySignatureStore::from_records(namespace, records))
    }

    /// Write every record in `store`, merged with the records already on
    /// disk. Records on disk are never dropped and keep their relative order.
    /// The file is replaced atomically while the lock is held.
    #[instrument(skip(self, store), fields(path = %self.path.display()))]
    pub async fn save<S: SignatureStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let _lock = self.lock().await?;
        let on_disk = self.load().await?;
        let persisted = on_disk.len();
        let records = merge(on_disk, store.records());
        let json = serde_json::to_vec_pretty(&records)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(
            count = records.len(),
            added = records.len() - persisted,
            "Snapshot saved"
        );
        Ok(())
    }

    /// Block until this process holds the snapshot's write lock
    async fn lock(&self) -> Result<SnapshotLock, StoreError> {
        let lock_path = self.path.with_extension("json.lock");
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| self.io_error(std::io::Error::other(e)))?
        .map_err(|e| self.io_error(e))?;
        Ok(SnapshotLock { _file: file })
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Released when the file handle closes
struct SnapshotLock {
    _file: File,
}

/// Disk records first, then new ones; the first record per
/// `(transaction, signer)` wins. Grouped by transaction id ascending.
fn merge(on_disk: Vec<SignatureRecord>, ours: Vec<SignatureRecord>) -> Vec<SignatureRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<SignatureRecord> = on_disk
        .into_iter()
        .chain(ours)
        .filter(|record| seen.insert((record.transaction_id, record.signer)))
        .collect();
    merged.sort_by_key(|record| record.transaction_id);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacksfort_common::{Network, RecoverableSignature, StacksAddress};

    fn record(tx: u64, n: u8) -> SignatureRecord {
        SignatureRecord::new(
            tx,
            StacksAddress::new(Network::Testnet, [n; 20]),
            RecoverableSignature::from_bytes(&[n; 65]).unwrap(),
            1_700_000_000_000 + n as i64,
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "absent");
        assert!(snapshot.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(&dir.path().join("nested"), "vault");

        let store = InMemorySignatureStore::new("vault");
        store.add(record(1, 1));
        store.add(record(1, 2));
        store.add(record(4, 1));
        snapshot.save(&store).await.unwrap();

        let restored = snapshot.load_store("vault").await.unwrap();
        assert_eq!(restored.records(), store.records());
        assert!(!snapshot.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_stale_writers_do_not_drop_records() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "vault");

        // Both processes start from the same empty snapshot
        let first = snapshot.load_store("vault").await.unwrap();
        let second = snapshot.load_store("vault").await.unwrap();
        assert!(first.add(record(1, 1)));
        assert!(second.add(record(1, 2)));

        snapshot.save(&first).await.unwrap();
        snapshot.save(&second).await.unwrap();

        let restored = snapshot.load_store("vault").await.unwrap();
        assert_eq!(restored.count_for(1), 2);
        assert_eq!(restored.list_for(1)[0], record(1, 1));
        assert_eq!(restored.list_for(1)[1], record(1, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_saves_keep_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "vault");

        let handles: Vec<_> = (1..=8u8)
            .map(|n| {
                let snapshot = snapshot.clone();
                tokio::spawn(async move {
                    let store = snapshot.load_store("vault").await.unwrap();
                    store.add(record(1, n));
                    store.add(record(2, n));
                    snapshot.save(&store).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let restored = snapshot.load_store("vault").await.unwrap();
        assert_eq!(restored.count_for(1), 8);
        assert_eq!(restored.count_for(2), 8);
        assert_eq!(restored.transaction_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_save_keeps_first_record_per_signer() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "vault");

        let earlier = InMemorySignatureStore::new("vault");
        earlier.add(record(3, 1));
        snapshot.save(&earlier).await.unwrap();

        let mut later = record(3, 1);
        later.timestamp = 42;
        let store = InMemorySignatureStore::new("vault");
        store.add(later);
        snapshot.save(&store).await.unwrap();

        let records = snapshot.load().await.unwrap();
        assert_eq!(records, vec![record(3, 1)]);
    }

    #[tokio::test]
    async fn test_save_refuses_to_overwrite_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "broken");
        tokio::fs::write(snapshot.path(), b"[{").await.unwrap();

        let store = InMemorySignatureStore::new("broken");
        store.add(record(1, 1));
        assert!(matches!(
            snapshot.save(&store).await,
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(tokio::fs::read(snapshot.path()).await.unwrap(), b"[{");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "broken");
        tokio::fs::write(snapshot.path(), b"{not json").await.unwrap();

        assert!(matches!(
            snapshot.load().await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_reads_browser_format() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::for_namespace(dir.path(), "legacy");
        let json = format!(
            r#"[{{"txnId":7,"signer":"ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM","signature":"{}","timestamp":1672531200000}}]"#,
            "ab".repeat(65)
        );
        tokio::fs::write(snapshot.path(), json).await.unwrap();

        let records = snapshot.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, 7);
        assert_eq!(records[0].signer.network(), Network::Testnet);
    }
}

//! In-memory signature store
//!
//! Uses DashMap so transactions never contend with each other. Each
//! transaction's records sit behind their own `RwLock`, which keeps the
//! duplicate check and the append in one short critical section.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use stacksfort_common::{SignatureRecord, StacksAddress};

use super::SignatureStore;

#[derive(Debug, Default)]
struct TransactionSignatures {
    /// Insertion order
    records: Vec<SignatureRecord>,
    signers: HashSet<StacksAddress>,
}

/// In-memory storage implementation
#[derive(Debug)]
pub struct InMemorySignatureStore {
    namespace: String,
    transactions: DashMap<u64, Arc<RwLock<TransactionSignatures>>>,
}

impl InMemorySignatureStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            transactions: DashMap::new(),
        }
    }

    /// Rebuild a store from a snapshot. Later duplicates of a
    /// `(transaction, signer)` pair are dropped.
    pub fn from_records<I>(namespace: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = SignatureRecord>,
    {
        let store = Self::new(namespace);
        let mut restored = 0usize;
        let mut skipped = 0usize;
        for record in records {
            if store.add(record) {
                restored += 1;
            } else {
                skipped += 1;
            }
        }
        debug!(
            namespace = %store.namespace,
            restored,
            skipped,
            "Restored signature store"
        );
        store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn entry(&self, transaction_id: u64) -> Option<Arc<RwLock<TransactionSignatures>>> {
        self.transactions
            .get(&transaction_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl SignatureStore for InMemorySignatureStore {
    fn add(&self, record: SignatureRecord) -> bool {
        let transaction_id = record.transaction_id;
        // Release the shard lock before taking the per-transaction lock
        let slot = Arc::clone(self.transactions.entry(transaction_id).or_default().value());

        let mut txn = slot.write();
        if !txn.signers.insert(record.signer) {
            debug!(tx_id = transaction_id, signer = %record.signer, "Duplicate signature ignored");
            return false;
        }
        debug!(tx_id = transaction_id, signer = %record.signer, "Signature stored");
        txn.records.push(record);
        true
    }

    fn list_for(&self, transaction_id: u64) -> Vec<SignatureRecord> {
        self.entry(transaction_id)
            .map(|slot| slot.read().records.clone())
            .unwrap_or_default()
    }

    fn has_signed(&self, transaction_id: u64, signer: &StacksAddress) -> bool {
        self.entry(transaction_id)
            .map(|slot| slot.read().signers.contains(signer))
            .unwrap_or(false)
    }

    fn count_for(&self, transaction_id: u64) -> usize {
        self.entry(transaction_id)
            .map(|slot| slot.read().records.len())
            .unwrap_or(0)
    }

    fn unique_signers(&self, transaction_id: u64) -> HashSet<StacksAddress> {
        self.entry(transaction_id)
            .map(|slot| slot.read().signers.clone())
            .unwrap_or_default()
    }

    fn records(&self) -> Vec<SignatureRecord> {
        self.transaction_ids()
            .into_iter()
            .flat_map(|id| self.list_for(id))
            .collect()
    }

    fn transaction_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .transactions
            .iter()
            .filter(|entry| !entry.value().read().records.is_empty())
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn reset(&self) {
        self.transactions.clear();
        debug!(namespace = %self.namespace, "Signature store reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacksfort_common::{Network, RecoverableSignature, SignatureOrder};

    fn signer(n: u8) -> StacksAddress {
        StacksAddress::new(Network::Mainnet, [n; 20])
    }

    fn record(tx: u64, n: u8, timestamp: i64) -> SignatureRecord {
        SignatureRecord::new(
            tx,
            signer(n),
            RecoverableSignature::from_bytes(&[n; 65]).unwrap(),
            timestamp,
        )
    }

    #[test]
    fn test_add_and_list() {
        let store = InMemorySignatureStore::new("test");
        assert!(store.add(record(1, 1, 100)));
        assert!(store.add(record(1, 2, 50)));
        assert!(store.add(record(2, 1, 10)));

        let listed = store.list_for(1);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].signer, signer(1));
        assert_eq!(listed[1].signer, signer(2));
        assert_eq!(store.count_for(2), 1);
        assert_eq!(store.count_for(3), 0);
        assert!(store.list_for(3).is_empty());
    }

    #[test]
    fn test_duplicate_is_noop() {
        let store = InMemorySignatureStore::new("test");
        let first = record(1, 1, 100);
        assert!(store.add(first.clone()));

        // Same signer, different signature bytes and time
        let mut again = record(1, 1, 999);
        again.signature = RecoverableSignature::from_bytes(&[7; 65]).unwrap();
        assert!(!store.add(again));

        assert_eq!(store.list_for(1), vec![first]);
        assert!(store.has_signed(1, &signer(1)));
        assert!(!store.has_signed(1, &signer(2)));
        assert!(!store.has_signed(2, &signer(1)));
    }

    #[test]
    fn test_list_ordered() {
        let store = InMemorySignatureStore::new("test");
        store.add(record(1, 1, 300));
        store.add(record(1, 2, 100));
        store.add(record(1, 3, 200));

        let asc: Vec<_> = store
            .list_ordered(1, SignatureOrder::TimestampAscending)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(asc, vec![100, 200, 300]);

        let desc: Vec<_> = store
            .list_ordered(1, SignatureOrder::TimestampDescending)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(desc, vec![300, 200, 100]);

        let insertion: Vec<_> = store
            .list_ordered(1, SignatureOrder::Insertion)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(insertion, vec![300, 100, 200]);
    }

    #[test]
    fn test_records_and_reset() {
        let store = InMemorySignatureStore::new("test");
        store.add(record(5, 1, 1));
        store.add(record(2, 1, 2));
        store.add(record(2, 2, 3));

        assert_eq!(store.transaction_ids(), vec![2, 5]);
        let all = store.records();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction_id, 2);
        assert_eq!(all[2].transaction_id, 5);
        assert_eq!(store.unique_signers(2).len(), 2);

        store.reset();
        assert!(store.records().is_empty());
        assert!(store.transaction_ids().is_empty());
    }

    #[test]
    fn test_from_records_deduplicates() {
        let store = InMemorySignatureStore::from_records(
            "restored",
            vec![record(1, 1, 1), record(1, 1, 2), record(1, 2, 3)],
        );
        assert_eq!(store.namespace(), "restored");
        assert_eq!(store.count_for(1), 2);
        assert_eq!(store.list_for(1)[0].timestamp, 1);
    }

    #[test]
    fn test_concurrent_adds_same_signer() {
        let store = InMemorySignatureStore::new("race");
        let inserted: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || store.add(record(1, 1, i)) as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(inserted, 1);
        assert_eq!(store.count_for(1), 1);
    }

    #[test]
    fn test_reads_consistent_during_adds() {
        let store = InMemorySignatureStore::new("race");
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            let writers: Vec<_> = (0..4u8)
                .map(|w| {
                    let store = &store;
                    s.spawn(move || {
                        for n in 0..50u8 {
                            let signer = w * 50 + n;
                            store.add(record(1, signer, signer as i64));
                            // Racing duplicate
                            store.add(record(1, signer, -1));
                        }
                    })
                })
                .collect();

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let store = &store;
                    let done = &done;
                    s.spawn(move || {
                        let mut reads = 0usize;
                        while !done.load(std::sync::atomic::Ordering::Acquire) || reads == 0 {
                            let before = store.count_for(1);
                            let listed = store.list_for(1);
                            let unique = store.unique_signers(1);
                            let after = store.count_for(1);

                            let distinct: HashSet<_> = listed.iter().map(|r| r.signer).collect();
                            assert_eq!(distinct.len(), listed.len());
                            assert!(listed.iter().all(|r| r.timestamp >= 0));
                            assert!(before <= listed.len());
                            assert!(listed.len() <= unique.len());
                            assert!(unique.len() <= after);
                            assert!(distinct.is_subset(&unique));
                            reads += 1;
                        }
                    })
                })
                .collect();

            for writer in writers {
                writer.join().unwrap();
            }
            done.store(true, std::sync::atomic::Ordering::Release);
            for reader in readers {
                reader.join().unwrap();
            }
        });

        assert_eq!(store.count_for(1), 200);
        assert_eq!(store.unique_signers(1).len(), store.list_for(1).len());
    }
}

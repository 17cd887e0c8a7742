//! Signature storage
//!
//! The store is an append-only table keyed by `(transaction id, signer)`.
//! Records are never updated or removed individually.

pub mod memory;
pub mod snapshot;

use std::collections::HashSet;

use stacksfort_common::{SignatureOrder, SignatureRecord, StacksAddress};

pub use memory::InMemorySignatureStore;
pub use snapshot::SnapshotFile;

/// Trait for signature storage backends
pub trait SignatureStore: Send + Sync {
    /// Insert a record. Returns `false` if this signer already has a record
    /// for the transaction; the existing record is left untouched.
    fn add(&self, record: SignatureRecord) -> bool;

    /// Records for a transaction in insertion order
    fn list_for(&self, transaction_id: u64) -> Vec<SignatureRecord>;

    /// Records for a transaction in the requested order
    fn list_ordered(&self, transaction_id: u64, order: SignatureOrder) -> Vec<SignatureRecord> {
        let mut records = self.list_for(transaction_id);
        stacksfort_common::types::signature_record::sort_records(&mut records, order);
        records
    }

    fn has_signed(&self, transaction_id: u64, signer: &StacksAddress) -> bool;

    fn count_for(&self, transaction_id: u64) -> usize;

    fn unique_signers(&self, transaction_id: u64) -> HashSet<StacksAddress>;

    /// Every record, grouped by transaction id ascending, insertion order within
    fn records(&self) -> Vec<SignatureRecord>;

    /// Transaction ids with at least one record, ascending
    fn transaction_ids(&self) -> Vec<u64>;

    /// Drop every record
    fn reset(&self);
}

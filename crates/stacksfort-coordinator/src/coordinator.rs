//! Signature coordination
//!
//! [`Coordinator`] is the public entry point: it hashes proposals, recovers
//! signers, checks authorization and expiration, and records admitted
//! signatures. Status is always recomputed from the store on read.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use stacksfort_common::crypto::hasher;
use stacksfort_common::types::signature_record::aggregate_signatures;
use stacksfort_common::{
    CanonicalHash, Network, RecoverableSignature, SignatureOrder, SignatureRecord,
    SignatureValidator, SignerSet, StacksAddress, TransactionProposal, TransactionStatus,
};

use crate::clock::Clock;
use crate::error::CoordinationError;
use crate::store::SignatureStore;

/// Whether an accepted submission added a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitOutcome {
    Inserted,
    /// This signer had already signed; the stored record is unchanged
    AlreadyPresent,
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub signer: StacksAddress,
    pub hash: CanonicalHash,
    pub outcome: SubmitOutcome,
}

/// Everything a caller needs to render or execute a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: u64,
    pub hash: CanonicalHash,
    pub signatures: Vec<SignatureRecord>,
    pub status: TransactionStatus,
    pub threshold: u32,
    /// Authorized signers who have signed, in signer-set order
    pub signed_by: Vec<StacksAddress>,
    /// Authorized signers who have not signed, in signer-set order
    pub awaiting: Vec<StacksAddress>,
}

/// Signature coordinator over a store and a clock
pub struct Coordinator<S, C> {
    store: Arc<S>,
    clock: C,
}

impl<S, C> Coordinator<S, C>
where
    S: SignatureStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Canonical hash signers must sign
    pub fn hash(&self, proposal: &TransactionProposal) -> Result<CanonicalHash, CoordinationError> {
        Ok(hasher::hash(proposal)?)
    }

    /// Recover the signer of `signature` over `hash`. No authorization check.
    pub fn validate_signature(
        &self,
        hash: &CanonicalHash,
        signature: &[u8],
        network: Network,
    ) -> Result<StacksAddress, CoordinationError> {
        Ok(SignatureValidator::new(network).validate(hash, signature)?)
    }

    /// Admit a raw 65-byte signature for `proposal`.
    ///
    /// Checks run in a fixed order: proposal shape, signature shape and
    /// recovery, signer membership, expiration. Only then is the store touched.
    #[instrument(skip(self, proposal, signature, signers), fields(tx_id = proposal.id))]
    pub fn submit_signature(
        &self,
        proposal: &TransactionProposal,
        signature: &[u8],
        signers: &SignerSet,
    ) -> Result<Submission, CoordinationError> {
        let hash = self.hash(proposal)?;
        let signature = RecoverableSignature::from_bytes(signature)?;
        self.admit(proposal, hash, signature, signers)
    }

    /// Same as [`Coordinator::submit_signature`] for a 130-character hex signature
    #[instrument(skip(self, proposal, signature, signers), fields(tx_id = proposal.id))]
    pub fn submit_signature_hex(
        &self,
        proposal: &TransactionProposal,
        signature: &str,
        signers: &SignerSet,
    ) -> Result<Submission, CoordinationError> {
        let hash = self.hash(proposal)?;
        let signature = RecoverableSignature::from_hex(signature)?;
        self.admit(proposal, hash, signature, signers)
    }

    fn admit(
        &self,
        proposal: &TransactionProposal,
        hash: CanonicalHash,
        signature: RecoverableSignature,
        signers: &SignerSet,
    ) -> Result<Submission, CoordinationError> {
        let signer = SignatureValidator::new(signers.network()).recover_signer(&hash, &signature)?;

        if !signers.contains(&signer) {
            debug!(signer = %signer, "Rejected signature from non-owner");
            return Err(CoordinationError::UnauthorizedSigner { signer });
        }

        let now = self.clock.now();
        if !proposal.is_signable_at(now) {
            debug!(now, expiration = proposal.expiration, "Rejected signature for expired proposal");
            return Err(CoordinationError::Expired {
                expiration: proposal.expiration,
                now,
            });
        }

        let record = SignatureRecord::new(
            proposal.id,
            signer,
            signature,
            self.clock.timestamp_millis(),
        );
        let outcome = if self.store.add(record) {
            SubmitOutcome::Inserted
        } else {
            SubmitOutcome::AlreadyPresent
        };
        debug!(signer = %signer, outcome = ?outcome, "Signature accepted");

        Ok(Submission {
            signer,
            hash,
            outcome,
        })
    }

    /// Status from ledger flags and the stored signature count
    pub fn get_status(&self, proposal: &TransactionProposal, signers: &SignerSet) -> TransactionStatus {
        let count = self.store.count_for(proposal.id);
        TransactionStatus::derive(
            proposal.executed,
            proposal.cancelled,
            count,
            signers.threshold(),
        )
    }

    pub fn get_signatures(&self, transaction_id: u64, order: SignatureOrder) -> Vec<SignatureRecord> {
        self.store.list_ordered(transaction_id, order)
    }

    pub fn has_signed(&self, transaction_id: u64, signer: &StacksAddress) -> bool {
        self.store.has_signed(transaction_id, signer)
    }

    /// Signatures in admission order, ready for the contract's execute call
    pub fn aggregate_signatures(&self, transaction_id: u64) -> Vec<RecoverableSignature> {
        aggregate_signatures(&self.store.list_for(transaction_id))
    }

    pub fn summary(
        &self,
        proposal: &TransactionProposal,
        signers: &SignerSet,
    ) -> Result<TransactionSummary, CoordinationError> {
        let hash = self.hash(proposal)?;
        let signatures = self.store.list_for(proposal.id);
        let signed = self.store.unique_signers(proposal.id);

        let (signed_by, awaiting): (Vec<StacksAddress>, Vec<StacksAddress>) = signers
            .signers()
            .iter()
            .copied()
            .partition(|address| signed.contains(address));

        let status = TransactionStatus::derive(
            proposal.executed,
            proposal.cancelled,
            signatures.len(),
            signers.threshold(),
        );

        Ok(TransactionSummary {
            id: proposal.id,
            hash,
            signatures,
            status,
            threshold: signers.threshold(),
            signed_by,
            awaiting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::InMemorySignatureStore;
    use k256::ecdsa::SigningKey;
    use stacksfort_common::crypto::wallet::{address_of, sign_hash};

    fn key(n: u8) -> SigningKey {
        SigningKey::from_slice(&[n; 32]).unwrap()
    }

    fn owner(n: u8) -> StacksAddress {
        address_of(&key(n), Network::Mainnet)
    }

    fn setup(now: u64) -> Coordinator<InMemorySignatureStore, ManualClock> {
        Coordinator::new(
            Arc::new(InMemorySignatureStore::new("test")),
            ManualClock::new(now),
        )
    }

    fn proposal() -> TransactionProposal {
        TransactionProposal::native_transfer(1, 1_000_000, owner(7).to_string(), 1000).unwrap()
    }

    fn signers() -> SignerSet {
        SignerSet::new(vec![owner(1), owner(2), owner(3)], 2).unwrap()
    }

    fn sign(n: u8, proposal: &TransactionProposal) -> RecoverableSignature {
        sign_hash(&key(n), &hasher::hash(proposal).unwrap()).unwrap()
    }

    #[test]
    fn test_submit_and_status() {
        let coordinator = setup(10);
        let proposal = proposal();
        let signers = signers();

        assert_eq!(coordinator.get_status(&proposal, &signers), TransactionStatus::Pending);

        let first = coordinator
            .submit_signature(&proposal, sign(1, &proposal).as_bytes(), &signers)
            .unwrap();
        assert_eq!(first.signer, owner(1));
        assert_eq!(first.outcome, SubmitOutcome::Inserted);
        assert_eq!(
            coordinator.get_status(&proposal, &signers),
            TransactionStatus::PartiallySigned
        );

        coordinator
            .submit_signature_hex(&proposal, &sign(2, &proposal).to_hex(), &signers)
            .unwrap();
        assert_eq!(
            coordinator.get_status(&proposal, &signers),
            TransactionStatus::QuorumReached
        );
        assert_eq!(coordinator.aggregate_signatures(1).len(), 2);
    }

    #[test]
    fn test_rejections_leave_store_untouched() {
        let coordinator = setup(10);
        let proposal = proposal();
        let signers = signers();

        let outsider = coordinator.submit_signature(&proposal, sign(9, &proposal).as_bytes(), &signers);
        assert!(matches!(
            outsider,
            Err(CoordinationError::UnauthorizedSigner { .. })
        ));

        let short = coordinator.submit_signature(&proposal, &[1u8; 64], &signers);
        assert!(matches!(short, Err(CoordinationError::MalformedSignature(_))));

        let mut bad = proposal.clone();
        bad.amount = 0;
        assert!(matches!(
            coordinator.submit_signature(&bad, sign(1, &proposal).as_bytes(), &signers),
            Err(CoordinationError::MalformedProposal(_))
        ));

        assert_eq!(coordinator.store().count_for(1), 0);
    }

    #[test]
    fn test_expiration_boundary() {
        let coordinator = setup(999);
        let proposal = proposal();
        let signers = signers();

        assert!(coordinator
            .submit_signature(&proposal, sign(1, &proposal).as_bytes(), &signers)
            .is_ok());

        coordinator.clock().set(1000);
        assert_eq!(
            coordinator.submit_signature(&proposal, sign(2, &proposal).as_bytes(), &signers),
            Err(CoordinationError::Expired {
                expiration: 1000,
                now: 1000
            })
        );
        assert_eq!(coordinator.store().count_for(1), 1);
    }

    #[test]
    fn test_summary() {
        let coordinator = setup(10);
        let proposal = proposal();
        let signers = signers();
        coordinator
            .submit_signature(&proposal, sign(2, &proposal).as_bytes(), &signers)
            .unwrap();

        let summary = coordinator.summary(&proposal, &signers).unwrap();
        assert_eq!(summary.id, 1);
        assert_eq!(summary.hash, hasher::hash(&proposal).unwrap());
        assert_eq!(summary.status, TransactionStatus::PartiallySigned);
        assert_eq!(summary.threshold, 2);
        assert_eq!(summary.signed_by, vec![owner(2)]);
        assert_eq!(summary.awaiting, vec![owner(1), owner(3)]);
    }

    #[test]
    fn test_status_counts_every_stored_signature() {
        let coordinator = setup(10);
        let proposal = proposal();
        coordinator
            .submit_signature(&proposal, sign(1, &proposal).as_bytes(), &signers())
            .unwrap();

        // Owner 1 is no longer in the set but its admitted signature still counts
        let rotated = SignerSet::new(vec![owner(2), owner(3)], 1).unwrap();
        assert_eq!(coordinator.store().count_for(proposal.id), 1);
        assert_eq!(
            coordinator.get_status(&proposal, &rotated),
            TransactionStatus::QuorumReached
        );

        let summary = coordinator.summary(&proposal, &rotated).unwrap();
        assert_eq!(summary.status, TransactionStatus::QuorumReached);
        assert_eq!(summary.signatures.len(), 1);
        assert!(summary.signed_by.is_empty());
        assert_eq!(summary.awaiting, vec![owner(2), owner(3)]);
    }
}

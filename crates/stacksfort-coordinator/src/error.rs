//! Coordinator errors

use stacksfort_common::error::{ProposalError, SignatureError};
use stacksfort_common::StacksAddress;
use thiserror::Error;

/// Why a signature submission was rejected.
///
/// A rejected submission never reaches the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinationError {
    #[error("Malformed proposal: {0}")]
    MalformedProposal(#[from] ProposalError),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signer recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Signer {signer} is not an owner of this vault")]
    UnauthorizedSigner { signer: StacksAddress },

    #[error("Proposal expired at {expiration} (now {now})")]
    Expired { expiration: u64, now: u64 },
}

impl From<SignatureError> for CoordinationError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Malformed(msg) => CoordinationError::MalformedSignature(msg),
            SignatureError::RecoveryFailed(msg) => CoordinationError::RecoveryFailed(msg),
        }
    }
}

/// Errors from snapshot persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot at {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

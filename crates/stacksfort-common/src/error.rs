//! Error types for StacksFort
//!
//! Domain errors raised while parsing addresses, validating proposals, and
//! recovering signers, plus the wrapper returned when decoding ledger JSON.

use thiserror::Error;

/// Errors raised while reading a proposal from ledger JSON
#[derive(Debug, Error)]
pub enum StacksfortError {
    #[error("Proposal error: {0}")]
    Proposal(#[from] ProposalError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Address and principal syntax errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    Invalid(String),

    #[error("Invalid c32 character {0:?}")]
    InvalidCharacter(char),

    #[error("Unsupported address version {0}")]
    UnsupportedVersion(u8),

    #[error("Checksum mismatch for address {0}")]
    ChecksumMismatch(String),

    #[error("Invalid contract name: {0:?}")]
    InvalidContractName(String),
}

/// Raised when a proposal cannot be hashed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProposalError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Invalid recipient {address}: {source}")]
    InvalidRecipient {
        address: String,
        source: AddressError,
    },

    #[error("Token transfer requires a token contract")]
    MissingToken,

    #[error("Native transfer must not reference a token contract")]
    UnexpectedToken,

    #[error("Invalid token contract {token}: {source}")]
    InvalidToken { token: String, source: AddressError },

    #[error("Proposal {0} is flagged both executed and cancelled")]
    ConflictingFlags(u64),
}

/// Signature parsing and recovery errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed signature: {0}")]
    Malformed(String),

    #[error("Signer recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Signer roster construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerSetError {
    #[error("Signer set is empty")]
    Empty,

    #[error("Invalid threshold {threshold} for {signers} signers")]
    InvalidThreshold { threshold: u32, signers: usize },

    #[error("Duplicate signer {0}")]
    DuplicateSigner(String),

    #[error("Invalid signer address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Signers span both mainnet and testnet")]
    MixedNetworks,
}

impl From<serde_json::Error> for StacksfortError {
    fn from(err: serde_json::Error) -> Self {
        StacksfortError::Serialization(err.to_string())
    }
}

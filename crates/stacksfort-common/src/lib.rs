//! # StacksFort Common
//!
//! Shared types, errors, and cryptographic primitives for StacksFort multisig
//! signature coordination.
//!
//! ## Core Types
//!
//! - [`TransactionProposal`]: a transfer awaiting owner signatures
//! - [`SignerSet`]: authorized owners plus the signing threshold
//! - [`SignatureRecord`]: one admitted signature
//! - [`TransactionStatus`]: status derived from ledger flags and signature count
//!
//! ## Crypto
//!
//! - [`crypto::hasher`]: canonical proposal hash
//! - [`crypto::validator`]: RSV signature parsing and signer recovery
//! - [`crypto::address`]: c32check Stacks addresses and contract principals
//! - [`crypto::wallet`]: local signing helpers

pub mod crypto;
pub mod display;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use crypto::{
    address::{ContractPrincipal, Network, StacksAddress},
    hasher::CanonicalHash,
    validator::{RecoverableSignature, SignatureValidator},
};
pub use error::StacksfortError;
pub use types::{
    proposal::{TransactionKind, TransactionProposal},
    signature_record::{SignatureOrder, SignatureRecord},
    signer_set::SignerSet,
    status::TransactionStatus,
};

/// StacksFort version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "stacksfort_signatures";

//! Cryptographic primitives for StacksFort
//!
//! This module provides:
//! - c32check address encoding
//! - Canonical proposal hashing (SHA-256 over Clarity consensus bytes)
//! - secp256k1 signature structure checks and signer recovery
//! - Local signing helpers standing in for a wallet

pub mod address;
pub mod c32;
pub mod hasher;
pub mod validator;
pub mod wallet;

// Re-export commonly used items
pub use address::{classify, AddressClass, ContractPrincipal, Network, StacksAddress};
pub use hasher::{hash, CanonicalHash};
pub use validator::{RecoverableSignature, SignatureValidator};

//! Key custody helpers
//!
//! The coordinator never sees private keys. These helpers stand in for the
//! wallet when producing signatures locally (tests, the `sign` CLI command).

use k256::ecdsa::SigningKey;

use crate::crypto::address::{Network, StacksAddress};
use crate::crypto::hasher::CanonicalHash;
use crate::crypto::validator::RecoverableSignature;
use crate::error::SignatureError;

/// Stacks private keys may carry a trailing `01` marking a compressed pubkey
const COMPRESSED_FLAG: u8 = 0x01;

/// Parse a 32-byte hex private key, optionally with the `01` compression suffix
pub fn parse_private_key(text: &str) -> Result<SigningKey, SignatureError> {
    let text = text.trim().strip_prefix("0x").unwrap_or(text.trim());
    let mut bytes =
        hex::decode(text).map_err(|e| SignatureError::Malformed(format!("private key: {e}")))?;

    if bytes.len() == 33 && bytes[32] == COMPRESSED_FLAG {
        bytes.truncate(32);
    }
    if bytes.len() != 32 {
        return Err(SignatureError::Malformed(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    SigningKey::from_slice(&bytes)
        .map_err(|e| SignatureError::Malformed(format!("private key: {e}")))
}

/// Sign a canonical hash, producing an RSV signature
pub fn sign_hash(
    key: &SigningKey,
    hash: &CanonicalHash,
) -> Result<RecoverableSignature, SignatureError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(hash.as_bytes())
        .map_err(|e| SignatureError::Malformed(format!("signing failed: {e}")))?;
    Ok(RecoverableSignature::from_parts(&signature, recovery_id))
}

/// Address controlled by `key` on `network`
pub fn address_of(key: &SigningKey, network: Network) -> StacksAddress {
    StacksAddress::from_public_key(network, key.verifying_key())
}

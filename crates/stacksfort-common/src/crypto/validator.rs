//! Recoverable secp256k1 signatures and signer recovery
//!
//! Signatures use the RSV layout produced by Stacks wallets when signing a
//! message hash: `r (32) | s (32) | v (1)`, where `v` is the recovery id.
//! Structural checks run before any curve arithmetic so garbage input is
//! rejected cheaply.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::crypto::address::{Network, StacksAddress};
use crate::crypto::hasher::CanonicalHash;
use crate::error::SignatureError;

/// Raw signature length in bytes
pub const SIGNATURE_LENGTH: usize = 65;

/// Hex-encoded signature length
pub const SIGNATURE_HEX_LENGTH: usize = SIGNATURE_LENGTH * 2;

const RECOVERY_BYTE_IDX: usize = SIGNATURE_LENGTH - 1;

/// Structurally valid 65-byte RSV signature.
///
/// Holding one says nothing about whether it recovers to anyone.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

impl RecoverableSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let array: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            SignatureError::Malformed(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parse exactly 130 hex characters, upper or lower case
    pub fn from_hex(text: &str) -> Result<Self, SignatureError> {
        if text.len() != SIGNATURE_HEX_LENGTH || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SignatureError::Malformed(format!(
                "expected {SIGNATURE_HEX_LENGTH} hex characters"
            )));
        }
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        hex::decode_to_slice(text, &mut bytes)
            .map_err(|e| SignatureError::Malformed(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..RECOVERY_BYTE_IDX].copy_from_slice(signature.to_bytes().as_ref());
        bytes[RECOVERY_BYTE_IDX] = recovery_id.to_byte();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn recovery_byte(&self) -> u8 {
        self.0[RECOVERY_BYTE_IDX]
    }

    /// Recover the public key that produced this signature over `hash`
    pub fn recover(&self, hash: &CanonicalHash) -> Result<VerifyingKey, SignatureError> {
        let recovery_id = RecoveryId::from_byte(self.recovery_byte()).ok_or_else(|| {
            SignatureError::RecoveryFailed(format!(
                "invalid recovery id {}",
                self.recovery_byte()
            ))
        })?;

        let signature = Signature::from_slice(&self.0[..RECOVERY_BYTE_IDX])
            .map_err(|e| SignatureError::RecoveryFailed(format!("invalid scalars: {e}")))?;

        VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Recovers signer addresses for one network.
///
/// Authorization (signer-set membership) is the caller's concern.
#[derive(Debug, Clone, Copy)]
pub struct SignatureValidator {
    network: Network,
}

impl SignatureValidator {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Structural check, then recovery of the signer address
    pub fn validate(
        &self,
        hash: &CanonicalHash,
        signature: &[u8],
    ) -> Result<StacksAddress, SignatureError> {
        let signature = RecoverableSignature::from_bytes(signature)?;
        self.recover_signer(hash, &signature)
    }

    /// Same as [`SignatureValidator::validate`] for hex-encoded input
    pub fn validate_hex(
        &self,
        hash: &CanonicalHash,
        signature: &str,
    ) -> Result<StacksAddress, SignatureError> {
        let signature = RecoverableSignature::from_hex(signature)?;
        self.recover_signer(hash, &signature)
    }

    pub fn recover_signer(
        &self,
        hash: &CanonicalHash,
        signature: &RecoverableSignature,
    ) -> Result<StacksAddress, SignatureError> {
        let key = signature.recover(hash)?;
        let address = StacksAddress::from_public_key(self.network, &key);
        debug!(hash = %hash, signer = %address, "Recovered signer");
        Ok(address)
    }
}

//! Canonical proposal hashing
//!
//! The hash is SHA-256 over the Clarity consensus serialization of the tuple
//! the multisig contract hashes in `hash-txn`:
//!
//! ```text
//! {amount: uint, expiration: uint, id: uint, recipient: principal,
//!  token: (optional principal), txn-type: uint}
//! ```
//!
//! Tuple entries are serialized in sorted-name order, so the layout is fixed.
//! `executed` and `cancelled` are ledger state, not execution inputs, and are
//! excluded.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::crypto::address::{ContractPrincipal, StacksAddress};
use crate::error::ProposalError;
use crate::types::proposal::TransactionProposal;

/// Hash size in bytes (SHA-256 output)
pub const HASH_SIZE: usize = 32;

// Clarity consensus type prefixes
const TYPE_UINT: u8 = 0x01;
const TYPE_PRINCIPAL_STANDARD: u8 = 0x05;
const TYPE_PRINCIPAL_CONTRACT: u8 = 0x06;
const TYPE_OPTIONAL_NONE: u8 = 0x09;
const TYPE_OPTIONAL_SOME: u8 = 0x0a;
const TYPE_TUPLE: u8 = 0x0c;

/// Canonical hash of a proposal, the 32 bytes signers sign
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalHash([u8; HASH_SIZE]);

impl CanonicalHash {
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for CanonicalHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CanonicalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CanonicalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalHash({})", self.to_hex())
    }
}

impl FromStr for CanonicalHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for CanonicalHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CanonicalHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the canonical hash of `proposal`
///
/// Fails with a [`ProposalError`] when the amount is zero, the recipient is
/// not a valid address, or the token reference does not match the kind.
pub fn hash(proposal: &TransactionProposal) -> Result<CanonicalHash, ProposalError> {
    let bytes = consensus_bytes(proposal)?;
    Ok(CanonicalHash(Sha256::digest(&bytes).into()))
}

/// Consensus serialization of the execution-relevant proposal fields
pub fn consensus_bytes(proposal: &TransactionProposal) -> Result<Vec<u8>, ProposalError> {
    let fields = proposal.validate()?;

    let mut out = Vec::with_capacity(160);
    out.push(TYPE_TUPLE);
    out.extend_from_slice(&6u32.to_be_bytes());

    put_name(&mut out, "amount");
    put_uint(&mut out, proposal.amount);

    put_name(&mut out, "expiration");
    put_uint(&mut out, proposal.expiration as u128);

    put_name(&mut out, "id");
    put_uint(&mut out, proposal.id as u128);

    put_name(&mut out, "recipient");
    put_standard_principal(&mut out, &fields.recipient);

    put_name(&mut out, "token");
    match &fields.token {
        None => out.push(TYPE_OPTIONAL_NONE),
        Some(token) => {
            out.push(TYPE_OPTIONAL_SOME);
            put_contract_principal(&mut out, token);
        }
    }

    put_name(&mut out, "txn-type");
    put_uint(&mut out, proposal.kind.code() as u128);

    Ok(out)
}

fn put_name(out: &mut Vec<u8>, name: &str) {
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
}

fn put_uint(out: &mut Vec<u8>, value: u128) {
    out.push(TYPE_UINT);
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_standard_principal(out: &mut Vec<u8>, address: &StacksAddress) {
    out.push(TYPE_PRINCIPAL_STANDARD);
    out.push(address.version());
    out.extend_from_slice(address.hash160());
}

fn put_contract_principal(out: &mut Vec<u8>, contract: &ContractPrincipal) {
    out.push(TYPE_PRINCIPAL_CONTRACT);
    out.push(contract.issuer.version());
    out.extend_from_slice(contract.issuer.hash160());
    // Contract names are validated to at most 128 bytes
    out.push(contract.name.len() as u8);
    out.extend_from_slice(contract.name.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::proposal::TransactionKind;

    const RECIPIENT: &str = "SP2HWDCFE994XKWNF7CW055T78KXTJ90P98RNPFQW";
    const TOKEN: &str = "SP3NW1VGB5AWYG9VTC062A53NW8N34GD1R7QANGAJ.sbtc-token";

    fn native() -> TransactionProposal {
        TransactionProposal::native_transfer(1, 1_000_000, RECIPIENT, 1000).unwrap()
    }

    #[test]
    fn test_pinned_native_vector() {
        let proposal = native();
        assert_eq!(
            hex::encode(consensus_bytes(&proposal).unwrap()),
            "0c0000000606616d6f756e7401000000000000000000000000000f42400a65787069726174696f6e01\
             000000000000000000000000000003e8026964010000000000000000000000000000000109726563\
             697069656e740516a3c6b1ee4a49d9f2af3b3802974744fba924164a05746f6b656e090874786e2d\
             747970650100000000000000000000000000000000"
        );
        assert_eq!(
            hash(&proposal).unwrap().to_hex(),
            "f8502af8b8eaadbd6a0e99099a5b757e708f129b1e96cd4c13f49d6fb7e1c2ab"
        );
    }

    #[test]
    fn test_pinned_token_vector() {
        let proposal = TransactionProposal::token_transfer(2, 250, RECIPIENT, TOKEN, 5000).unwrap();
        assert_eq!(
            hash(&proposal).unwrap().to_hex(),
            "bb91a0a42d89006480c812c9a85931fe96232e4bcfcdc9f4c5452dcc539365a0"
        );
    }

    #[test]
    fn test_deterministic() {
        let proposal = native();
        assert_eq!(hash(&proposal).unwrap(), hash(&proposal.clone()).unwrap());
    }

    #[test]
    fn test_every_field_changes_hash() {
        let base = hash(&native()).unwrap();

        let mut p = native();
        p.id = 2;
        assert_ne!(hash(&p).unwrap(), base);

        let mut p = native();
        p.amount += 1;
        assert_ne!(hash(&p).unwrap(), base);

        let mut p = native();
        p.expiration += 1;
        assert_ne!(hash(&p).unwrap(), base);

        let mut p = native();
        p.recipient = "SP1WV0048ERKB55592H81MK6J4TTRP8TSGC4JX54N".to_string();
        assert_ne!(hash(&p).unwrap(), base);

        // Same hash160 on the other network
        let mut p = native();
        p.recipient = "ST2HWDCFE994XKWNF7CW055T78KXTJ90P9B4HHQDZ".to_string();
        assert_ne!(hash(&p).unwrap(), base);

        let mut p = native();
        p.kind = TransactionKind::TokenTransfer;
        p.token = Some(TOKEN.to_string());
        assert_ne!(hash(&p).unwrap(), base);
    }

    #[test]
    fn test_ledger_flags_excluded() {
        let base = hash(&native()).unwrap();
        let mut p = native();
        p.executed = true;
        assert_eq!(hash(&p).unwrap(), base);

        let mut p = native();
        p.cancelled = true;
        assert_eq!(hash(&p).unwrap(), base);
    }

    #[test]
    fn test_malformed_proposal_rejected() {
        let mut p = native();
        p.amount = 0;
        assert_eq!(hash(&p), Err(ProposalError::ZeroAmount));

        let mut p = native();
        p.recipient = "not-an-address".to_string();
        assert!(matches!(hash(&p), Err(ProposalError::InvalidRecipient { .. })));

        let mut p = native();
        p.kind = TransactionKind::TokenTransfer;
        assert_eq!(hash(&p), Err(ProposalError::MissingToken));
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(&native()).unwrap();
        let parsed: CanonicalHash = format!("0x{h}").parse().unwrap();
        assert_eq!(parsed, h);
        assert!("abcd".parse::<CanonicalHash>().is_err());
    }
}

//! Stacks address and principal handling
//!
//! A standard principal is `S` + c32check(version, hash160). Two versions are
//! recognised: 22 (`SP…`, mainnet single-sig) and 26 (`ST…`, testnet
//! single-sig). Everything else classifies as invalid.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::VerifyingKey;
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::c32;
use crate::error::AddressError;

/// hash160 length in bytes
pub const HASH160_LENGTH: usize = 20;

/// Maximum contract name length accepted by the ledger
pub const MAX_CONTRACT_NAME_LENGTH: usize = 128;

/// Network context of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// c32check version byte for single-sig addresses
    pub fn version(self) -> u8 {
        match self {
            Network::Mainnet => 22,
            Network::Testnet => 26,
        }
    }

    /// Two-character textual prefix
    pub fn prefix(self) -> &'static str {
        match self {
            Network::Mainnet => "SP",
            Network::Testnet => "ST",
        }
    }

    pub fn from_version(version: u8) -> Option<Self> {
        match version {
            22 => Some(Network::Mainnet),
            26 => Some(Network::Testnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(AddressError::Invalid(format!("unknown network {other:?}"))),
        }
    }
}

/// Classification of an arbitrary string as an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Mainnet,
    Testnet,
    Invalid,
}

/// Classify `address` into exactly one of mainnet, testnet, or invalid
pub fn classify(address: &str) -> AddressClass {
    match address.parse::<StacksAddress>() {
        Ok(addr) => match addr.network() {
            Network::Mainnet => AddressClass::Mainnet,
            Network::Testnet => AddressClass::Testnet,
        },
        Err(_) => AddressClass::Invalid,
    }
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; HASH160_LENGTH] {
    let sha = Sha256::digest(data);
    let digest = Ripemd160::digest(sha);
    let mut out = [0u8; HASH160_LENGTH];
    out.copy_from_slice(&digest);
    out
}

/// Standard (single-sig) Stacks principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StacksAddress {
    network: Network,
    hash160: [u8; HASH160_LENGTH],
}

impl StacksAddress {
    pub fn new(network: Network, hash160: [u8; HASH160_LENGTH]) -> Self {
        Self { network, hash160 }
    }

    /// Address of a compressed secp256k1 public key
    pub fn from_public_key(network: Network, key: &VerifyingKey) -> Self {
        let encoded = key.to_encoded_point(true);
        Self::new(network, hash160(encoded.as_bytes()))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn version(&self) -> u8 {
        self.network.version()
    }

    pub fn hash160(&self) -> &[u8; HASH160_LENGTH] {
        &self.hash160
    }
}

impl fmt::Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Both versions are < 32, so encoding cannot fail
        match c32::check_encode(self.version(), &self.hash160) {
            Ok(body) => write!(f, "S{body}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for StacksAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix('S')
            .ok_or_else(|| AddressError::Invalid(format!("{s:?} does not start with 'S'")))?;

        let (version, data) = c32::check_decode(body)?;
        let network =
            Network::from_version(version).ok_or(AddressError::UnsupportedVersion(version))?;

        let hash: [u8; HASH160_LENGTH] = data.as_slice().try_into().map_err(|_| {
            AddressError::Invalid(format!(
                "expected {HASH160_LENGTH}-byte hash160, got {} bytes",
                data.len()
            ))
        })?;

        let address = Self::new(network, hash);
        // Reject alternative spellings of the same payload (extra leading zeros)
        if address.to_string() != s {
            return Err(AddressError::Invalid(format!("{s:?} is not canonical")));
        }
        Ok(address)
    }
}

impl Serialize for StacksAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StacksAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Contract principal `ADDRESS.contract-name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractPrincipal {
    pub issuer: StacksAddress,
    pub name: String,
}

impl ContractPrincipal {
    pub fn new(issuer: StacksAddress, name: impl Into<String>) -> Result<Self, AddressError> {
        let name = name.into();
        validate_contract_name(&name)?;
        Ok(Self { issuer, name })
    }
}

impl fmt::Display for ContractPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.issuer, self.name)
    }
}

impl FromStr for ContractPrincipal {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (issuer, name) = s
            .split_once('.')
            .ok_or_else(|| AddressError::Invalid(format!("{s:?} is not a contract principal")))?;
        Self::new(issuer.parse()?, name)
    }
}

fn validate_contract_name(name: &str) -> Result<(), AddressError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !starts_with_letter || !rest_ok || name.len() > MAX_CONTRACT_NAME_LENGTH {
        return Err(AddressError::InvalidContractName(name.to_string()));
    }
    Ok(())
}

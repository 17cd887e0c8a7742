//! SignerSet - authorized signer roster and quorum threshold

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::crypto::address::{Network, StacksAddress};
use crate::error::SignerSetError;

/// Authorized signers of a multisig deployment plus its threshold.
///
/// Invariants: non-empty, duplicate-free, single network,
/// `1 <= threshold <= signers.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignerSetData", into = "SignerSetData")]
pub struct SignerSet {
    signers: Vec<StacksAddress>,
    threshold: u32,
}

/// Wire shape of a signer set, as returned by `get-signers` / `get-threshold`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSetData {
    pub signers: Vec<String>,
    pub threshold: u32,
}

impl SignerSet {
    pub fn new(signers: Vec<StacksAddress>, threshold: u32) -> Result<Self, SignerSetError> {
        let first = signers.first().ok_or(SignerSetError::Empty)?;
        let network = first.network();

        if threshold == 0 || threshold as usize > signers.len() {
            return Err(SignerSetError::InvalidThreshold {
                threshold,
                signers: signers.len(),
            });
        }

        let mut seen = HashSet::with_capacity(signers.len());
        for signer in &signers {
            if signer.network() != network {
                return Err(SignerSetError::MixedNetworks);
            }
            if !seen.insert(signer) {
                return Err(SignerSetError::DuplicateSigner(signer.to_string()));
            }
        }

        Ok(Self { signers, threshold })
    }

    /// Parse textual addresses, then validate as in [`SignerSet::new`]
    pub fn from_strings<I, S>(signers: I, threshold: u32) -> Result<Self, SignerSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = signers
            .into_iter()
            .map(|s| s.as_ref().parse::<StacksAddress>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed, threshold)
    }

    pub fn signers(&self) -> &[StacksAddress] {
        &self.signers
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn contains(&self, address: &StacksAddress) -> bool {
        self.signers.contains(address)
    }

    /// Network shared by every signer
    pub fn network(&self) -> Network {
        // Construction guarantees at least one signer
        self.signers
            .first()
            .map(StacksAddress::network)
            .unwrap_or(Network::Mainnet)
    }
}

impl TryFrom<SignerSetData> for SignerSet {
    type Error = SignerSetError;

    fn try_from(data: SignerSetData) -> Result<Self, Self::Error> {
        Self::from_strings(data.signers, data.threshold)
    }
}

impl From<SignerSet> for SignerSetData {
    fn from(set: SignerSet) -> Self {
        Self {
            signers: set.signers.iter().map(ToString::to_string).collect(),
            threshold: set.threshold,
        }
    }
}

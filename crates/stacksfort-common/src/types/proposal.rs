//! TransactionProposal - a multisig transfer awaiting signatures
//!
//! Proposals are created on-chain by the multisig contract and read back by
//! the ledger reader. This type is the strict boundary representation: the
//! loose contract payload is parsed into it and validated before any signature
//! work happens.

use serde::{Deserialize, Serialize};

use crate::crypto::address::{ContractPrincipal, StacksAddress};
use crate::error::{ProposalError, StacksfortError};

/// Kind of transfer a proposal performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Native STX transfer
    #[serde(rename = "stx")]
    NativeTransfer,
    /// SIP-010 fungible token transfer
    #[serde(rename = "token")]
    TokenTransfer,
}

impl TransactionKind {
    /// `txn-type` code used by the contract
    pub fn code(self) -> u8 {
        match self {
            TransactionKind::NativeTransfer => 0,
            TransactionKind::TokenTransfer => 1,
        }
    }
}

/// Multisig transaction proposal as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProposal {
    /// Contract-assigned transaction id
    pub id: u64,

    /// Transfer kind
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Amount in the smallest denomination
    #[serde(with = "amount_string")]
    pub amount: u128,

    /// Recipient standard principal
    pub recipient: String,

    /// Token contract principal, only for token transfers
    #[serde(
        rename = "tokenContract",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<String>,

    /// Block height or timestamp after which signing stops
    pub expiration: u64,

    #[serde(default)]
    pub executed: bool,

    #[serde(default)]
    pub cancelled: bool,
}

/// Parsed execution-relevant fields of a proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub recipient: StacksAddress,
    pub token: Option<ContractPrincipal>,
}

impl TransactionProposal {
    /// Create a validated native STX transfer proposal
    pub fn native_transfer(
        id: u64,
        amount: u128,
        recipient: impl Into<String>,
        expiration: u64,
    ) -> Result<Self, ProposalError> {
        let proposal = Self {
            id,
            kind: TransactionKind::NativeTransfer,
            amount,
            recipient: recipient.into(),
            token: None,
            expiration,
            executed: false,
            cancelled: false,
        };
        proposal.validate()?;
        Ok(proposal)
    }

    /// Create a validated token transfer proposal
    pub fn token_transfer(
        id: u64,
        amount: u128,
        recipient: impl Into<String>,
        token: impl Into<String>,
        expiration: u64,
    ) -> Result<Self, ProposalError> {
        let proposal = Self {
            id,
            kind: TransactionKind::TokenTransfer,
            amount,
            recipient: recipient.into(),
            token: Some(token.into()),
            expiration,
            executed: false,
            cancelled: false,
        };
        proposal.validate()?;
        Ok(proposal)
    }

    /// Parse a ledger response, rejecting malformed proposals at the boundary
    pub fn from_json(json: &str) -> Result<Self, StacksfortError> {
        let proposal: Self = serde_json::from_str(json)?;
        proposal.validate()?;
        Ok(proposal)
    }

    /// Check every field that affects execution
    pub fn validate(&self) -> Result<ValidatedFields, ProposalError> {
        if self.amount == 0 {
            return Err(ProposalError::ZeroAmount);
        }
        if self.executed && self.cancelled {
            return Err(ProposalError::ConflictingFlags(self.id));
        }

        let recipient =
            self.recipient
                .parse::<StacksAddress>()
                .map_err(|source| ProposalError::InvalidRecipient {
                    address: self.recipient.clone(),
                    source,
                })?;

        let token = match (self.kind, self.token.as_deref()) {
            (TransactionKind::NativeTransfer, None) => None,
            (TransactionKind::NativeTransfer, Some(_)) => {
                return Err(ProposalError::UnexpectedToken)
            }
            (TransactionKind::TokenTransfer, None) => return Err(ProposalError::MissingToken),
            (TransactionKind::TokenTransfer, Some(token)) => {
                Some(token.parse::<ContractPrincipal>().map_err(|source| {
                    ProposalError::InvalidToken {
                        token: token.to_string(),
                        source,
                    }
                })?)
            }
        };

        Ok(ValidatedFields { recipient, token })
    }

    /// Whether the proposal still accepts signatures at `now`
    pub fn is_signable_at(&self, now: u64) -> bool {
        now < self.expiration
    }
}

/// Serde helper: u128 amounts travel as decimal strings, numbers are accepted
mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Amount::deserialize(deserializer)? {
            Amount::Text(text) => text
                .parse::<u128>()
                .map_err(|e| de::Error::custom(format!("invalid amount {text:?}: {e}"))),
            Amount::Number(n) => Ok(n as u128),
        }
    }
}

//! SignatureRecord - one admitted signature for one transaction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::address::StacksAddress;
use crate::crypto::validator::RecoverableSignature;

/// Admitted signature. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Contract transaction id
    #[serde(rename = "txnId")]
    pub transaction_id: u64,

    /// Address recovered from the signature
    pub signer: StacksAddress,

    /// RSV signature over the canonical hash
    pub signature: RecoverableSignature,

    /// Admission time (Unix milliseconds)
    pub timestamp: i64,
}

impl SignatureRecord {
    pub fn new(
        transaction_id: u64,
        signer: StacksAddress,
        signature: RecoverableSignature,
        timestamp: i64,
    ) -> Self {
        Self {
            transaction_id,
            signer,
            signature,
            timestamp,
        }
    }
}

/// Order in which to return a transaction's signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureOrder {
    /// Order of admission
    #[default]
    Insertion,
    /// Oldest first
    TimestampAscending,
    /// Newest first
    TimestampDescending,
}

impl FromStr for SignatureOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insertion" => Ok(SignatureOrder::Insertion),
            "asc" | "timestamp-ascending" => Ok(SignatureOrder::TimestampAscending),
            "desc" | "timestamp-descending" => Ok(SignatureOrder::TimestampDescending),
            other => Err(format!("unknown signature order {other:?}")),
        }
    }
}

impl fmt::Display for SignatureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureOrder::Insertion => write!(f, "insertion"),
            SignatureOrder::TimestampAscending => write!(f, "asc"),
            SignatureOrder::TimestampDescending => write!(f, "desc"),
        }
    }
}

/// Reorder records in place. Stable, so equal timestamps keep admission order.
pub fn sort_records(records: &mut [SignatureRecord], order: SignatureOrder) {
    match order {
        SignatureOrder::Insertion => {}
        SignatureOrder::TimestampAscending => records.sort_by_key(|r| r.timestamp),
        SignatureOrder::TimestampDescending => {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp))
        }
    }
}

/// Signature list in the order handed to the contract's execute call
pub fn aggregate_signatures(records: &[SignatureRecord]) -> Vec<RecoverableSignature> {
    records.iter().map(|r| r.signature).collect()
}

//! Transaction lifecycle status
//!
//! Status is never stored. It is derived on every read from the ledger flags
//! and the current signature count, so it cannot drift from its inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived lifecycle status of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    /// No signatures yet
    Pending,
    /// At least one signature, below threshold
    PartiallySigned,
    /// Threshold reached, ready to execute
    QuorumReached,
    /// Executed on-chain
    Executed,
    /// Cancelled on-chain
    Cancelled,
}

impl TransactionStatus {
    /// Classify a proposal. First match wins: executed, cancelled, quorum,
    /// partial, pending.
    pub fn derive(executed: bool, cancelled: bool, signature_count: usize, threshold: u32) -> Self {
        if executed {
            TransactionStatus::Executed
        } else if cancelled {
            TransactionStatus::Cancelled
        } else if threshold_met(signature_count, threshold) {
            TransactionStatus::QuorumReached
        } else if signature_count > 0 {
            TransactionStatus::PartiallySigned
        } else {
            TransactionStatus::Pending
        }
    }

    /// Executed and cancelled never change again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Executed | TransactionStatus::Cancelled
        )
    }

    pub fn can_execute(self) -> bool {
        self == TransactionStatus::QuorumReached
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::PartiallySigned => "partially-signed",
            TransactionStatus::QuorumReached => "quorum-reached",
            TransactionStatus::Executed => "executed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `signature_count` distinct signatures satisfy `threshold`
#[inline]
pub fn threshold_met(signature_count: usize, threshold: u32) -> bool {
    signature_count >= threshold as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executed_takes_precedence() {
        for cancelled in [false, true] {
            for count in 0..5 {
                for threshold in 1..4 {
                    assert_eq!(
                        TransactionStatus::derive(true, cancelled, count, threshold),
                        TransactionStatus::Executed
                    );
                }
            }
        }
    }

    #[test]
    fn test_cancelled_ignores_count() {
        for count in 0..5 {
            assert_eq!(
                TransactionStatus::derive(false, true, count, 2),
                TransactionStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(
            TransactionStatus::derive(false, false, 2, 3),
            TransactionStatus::PartiallySigned
        );
        assert_eq!(
            TransactionStatus::derive(false, false, 3, 3),
            TransactionStatus::QuorumReached
        );
        assert_eq!(
            TransactionStatus::derive(false, false, 4, 3),
            TransactionStatus::QuorumReached
        );
        // threshold - 1 == 0
        assert_eq!(
            TransactionStatus::derive(false, false, 0, 1),
            TransactionStatus::Pending
        );
        assert_eq!(
            TransactionStatus::derive(false, false, 1, 1),
            TransactionStatus::QuorumReached
        );
    }

    #[test]
    fn test_terminal_and_executable() {
        assert!(TransactionStatus::Executed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(!TransactionStatus::QuorumReached.is_terminal());
        assert!(TransactionStatus::QuorumReached.can_execute());
        assert!(!TransactionStatus::PartiallySigned.can_execute());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::PartiallySigned).unwrap(),
            "\"partially-signed\""
        );
        assert_eq!(TransactionStatus::QuorumReached.to_string(), "quorum-reached");
    }
}

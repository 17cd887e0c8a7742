//! # StacksFort Coordinator
//!
//! Off-chain collection of owner signatures for multisig vault transactions.
//!
//! Owners sign a proposal's canonical hash with their wallets. The coordinator
//! recovers each signer from the signature, admits only vault owners while the
//! proposal is live, and reports when enough owners have signed for the
//! contract to execute.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Coordinator                   │
//! │   hash ─▶ recover signer ─▶ owner? ─▶ live?   │
//! │                                      │        │
//! │  ┌───────────────────────────────────┴─────┐  │
//! │  │            SignatureStore               │  │
//! │  │   (tx, signer) → record, append-only    │  │
//! │  └───────────────────────────────────┬─────┘  │
//! └──────────────────────────────────────┼────────┘
//!                                        ▼
//!                                  SnapshotFile
//! ```

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClockKind, CoordinatorConfig};
pub use coordinator::{Coordinator, Submission, SubmitOutcome, TransactionSummary};
pub use error::{CoordinationError, StoreError};
pub use store::{InMemorySignatureStore, SignatureStore, SnapshotFile};

//! Time sources for expiration checks and record timestamps
//!
//! `now()` is whatever unit proposals use for `expiration`: Unix seconds for
//! [`SystemClock`], usually a block height for [`ManualClock`].

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

pub trait Clock: Send + Sync {
    /// Value compared against `TransactionProposal::expiration`
    fn now(&self) -> u64;

    /// Timestamp stamped on admitted signatures (Unix milliseconds)
    fn timestamp_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }

    fn timestamp_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock for tests and block-height expirations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
            millis: AtomicI64::new(chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: u64) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set_timestamp_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn timestamp_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }

    fn timestamp_millis(&self) -> i64 {
        (**self).timestamp_millis()
    }
}

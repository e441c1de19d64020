//! Admission gate for outstanding network operations.
//!
//! Both the port scanner and the discovery sweep run every attempt as its
//! own future and gate it through a [`ConcurrencyLimiter`]. The permit is an
//! RAII guard, so the slot is released on every exit path of the guarded
//! operation, including errors and timeouts.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Default bound for connect scans.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 500;

/// Default bound for liveness sweeps.
pub const DEFAULT_DISCOVERY_WORKERS: usize = 200;

/// A counting admission gate with a fixed bound.
///
/// Cloning shares the same underlying counter.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

/// Proof of admission. Dropping it releases the slot.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting at most `limit` operations at once.
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Suspend until fewer than `limit` operations are in flight, then
    /// admit one.
    ///
    /// Only fails if the limiter has been closed, which never happens for
    /// limiters built by this crate.
    pub async fn acquire(&self) -> Result<LimiterPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok(LimiterPermit { _permit: permit })
    }

    /// The configured bound.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of operations currently admitted.
    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }
}

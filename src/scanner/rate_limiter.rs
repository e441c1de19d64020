//! Optional pacing for connect attempts.
//!
//! A token bucket caps how many new connection attempts start per second.
//! It sits in front of the concurrency bound and never replaces it.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;

/// A shared attempts-per-second limiter.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DefaultDirectRateLimiter>,
    rate: NonZeroU32,
}

impl RateLimiter {
    /// Create a limiter for `rate` attempts per second. Returns `None` for
    /// zero, which means unlimited.
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        Some(Self {
            limiter: Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(rate))),
            rate,
        })
    }

    /// Wait until the next attempt may start.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Configured attempts per second.
    pub fn rate(&self) -> u32 {
        self.rate.get()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("rate", &self.rate).finish()
    }
}

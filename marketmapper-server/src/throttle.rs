//! Outbound request pacing
//!
//! A token bucket shared by every request that talks to a rate-limited API.
//! With a burst of one, consecutive calls are spaced by at least the
//! configured interval, process-wide.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Trait for something that decides when the next outbound call may start
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until a call is allowed
    async fn acquire(&self);
}

/// Token-bucket throttle backed by `governor`
pub struct GovernorThrottle {
    limiter: DefaultDirectRateLimiter,
}

impl GovernorThrottle {
    /// Allow one call per `min_interval`; a zero interval disables pacing
    pub fn new(min_interval: Duration) -> Self {
        let quota = Quota::with_period(min_interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
        Self::with_quota(quota)
    }

    /// Use an explicit quota, e.g. a documented requests-per-minute limit
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }
}

#[async_trait]
impl Throttle for GovernorThrottle {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

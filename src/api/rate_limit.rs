//! Keyed token-bucket rate limiting.
//!
//! One [`RateLimit`] tracks an independent bucket per key (client IP or user).
//! Buckets live in memory and are pruned periodically with `retain_recent`.

use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{fmt, num::NonZeroU32, time::Duration};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

pub struct RateLimit {
    name: &'static str,
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl RateLimit {
    #[must_use]
    pub fn new(name: &'static str, quota: Quota) -> Self {
        Self {
            name,
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    #[must_use]
    pub fn per_minute(name: &'static str, requests: NonZeroU32) -> Self {
        Self::new(name, Quota::per_minute(requests))
    }

    #[must_use]
    pub fn per_hour(name: &'static str, requests: NonZeroU32) -> Self {
        Self::new(name, Quota::per_hour(requests))
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Consume one request from `key`'s bucket.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => RateLimitDecision::Allowed,
            Err(not_until) => RateLimitDecision::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        }
    }

    /// Drop buckets that have fully refilled.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }
}

impl fmt::Debug for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimit")
            .field("name", &self.name)
            .field("keys", &self.len())
            .finish()
    }
}

//! Per-actor command rate limiting.
//!
//! Uses the `governor` crate's token bucket with a configurable steady rate
//! and burst. Each actor gets their own bucket, dropped when they leave.

use crate::config::RateLimitConfig;
use crate::state::PlayerId;
use dashmap::DashMap;
use governor::{Quota, RateLimiter as GovRateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use tracing::debug;

type DirectRateLimiter = governor::DefaultDirectRateLimiter;

/// Thread-safe command rate limit manager.
#[derive(Debug)]
pub struct RateLimitManager {
    command_limiters: DashMap<PlayerId, DirectRateLimiter>,
    quota: Quota,
}

impl RateLimitManager {
    pub fn new(config: &RateLimitConfig) -> Self {
        let rate = NonZeroU32::new(config.commands_per_second).unwrap_or(nonzero!(4u32));
        let burst = NonZeroU32::new(config.command_burst).unwrap_or(rate);
        Self {
            command_limiters: DashMap::new(),
            quota: Quota::per_second(rate).allow_burst(burst),
        }
    }

    /// Check if an actor can run another command.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn check_command_rate(&self, id: &PlayerId) -> bool {
        let limiter = self
            .command_limiters
            .entry(id.clone())
            .or_insert_with(|| GovRateLimiter::direct(self.quota));

        let allowed = limiter.check().is_ok();
        if !allowed {
            debug!(player = %id, "command rate limit exceeded");
        }
        allowed
    }

    /// Remove an actor's bucket (on disconnect).
    pub fn remove_client(&self, id: &PlayerId) {
        self.command_limiters.remove(id);
    }

    pub fn tracked(&self) -> usize {
        self.command_limiters.len()
    }
}

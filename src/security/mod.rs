//! Security module for fishd.
//!
//! - **Cooldowns**: server-wide one-run-per-window gates (restart, clean)
//! - **Rate Limiting**: governor-based per-actor command flood protection
//! - **Patterns**: recognizers for stable ids and IP addresses in arguments

pub mod cooldown;
pub mod patterns;
pub mod rate_limit;

pub use cooldown::{Cooldown, Cooldowns, format_duration};
pub use patterns::{is_ip, is_stable_id};
pub use rate_limit::RateLimitManager;

//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, StorageConfig)
//! - [`limits`]: Output limits and cooldown configuration (LimitsConfig, CooldownConfig)
//! - [`security`]: Rate limiting configuration (RateLimitConfig)
//! - [`validation`]: Startup validation of the loaded configuration

mod limits;
mod security;
mod types;
mod validation;

pub use limits::{CooldownConfig, LimitsConfig};
pub use security::RateLimitConfig;
pub use types::{Config, ConfigError, ServerConfig, StorageConfig};
pub use validation::{ValidationError, validate};

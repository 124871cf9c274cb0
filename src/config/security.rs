//! Rate limiting configuration.

use serde::Deserialize;

/// Per-actor command rate limits. The console is never limited.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Commands allowed per actor per second (default: 4).
    #[serde(default = "default_commands_per_second")]
    pub commands_per_second: u32,
    /// Burst allowance on top of the steady rate (default: 8).
    #[serde(default = "default_command_burst")]
    pub command_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            commands_per_second: default_commands_per_second(),
            command_burst: default_command_burst(),
        }
    }
}

fn default_commands_per_second() -> u32 {
    4
}

fn default_command_burst() -> u32 {
    8
}

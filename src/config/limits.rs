//! Output limits and cooldown configuration.

use serde::Deserialize;
use std::time::Duration;

/// Limits on command output and argument resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Commands per help page (default: 15).
    #[serde(default = "default_help_page_size")]
    pub help_page_size: usize,
    /// Name searches with more matches than this fall back to exact matches (default: 20).
    #[serde(default = "default_name_search_threshold")]
    pub name_search_threshold: usize,
    /// Seconds an unanswered menu choice stays valid (default: 120).
    #[serde(default = "default_choice_ttl_secs")]
    pub choice_ttl_secs: u64,
    /// Upper bound for /label duration in seconds (default: 3600).
    #[serde(default = "default_max_label_secs")]
    pub max_label_secs: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            help_page_size: default_help_page_size(),
            name_search_threshold: default_name_search_threshold(),
            choice_ttl_secs: default_choice_ttl_secs(),
            max_label_secs: default_max_label_secs(),
        }
    }
}

impl LimitsConfig {
    pub fn choice_ttl(&self) -> Duration {
        Duration::from_secs(self.choice_ttl_secs)
    }
}

fn default_help_page_size() -> usize {
    15
}

fn default_name_search_threshold() -> usize {
    20
}

fn default_choice_ttl_secs() -> u64 {
    120
}

fn default_max_label_secs() -> u32 {
    3600
}

/// Server-wide command cooldowns.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Minimum seconds between restarts (default: 600).
    #[serde(default = "default_restart_secs")]
    pub restart_secs: u64,
    /// Minimum seconds between boulder cleanups (default: 10).
    #[serde(default = "default_clean_secs")]
    pub clean_secs: u64,
    /// Seconds counted down before a restart (default: 5).
    #[serde(default = "default_restart_countdown_secs")]
    pub restart_countdown_secs: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            restart_secs: default_restart_secs(),
            clean_secs: default_clean_secs(),
            restart_countdown_secs: default_restart_countdown_secs(),
        }
    }
}

fn default_restart_secs() -> u64 {
    600
}

fn default_clean_secs() -> u64 {
    10
}

fn default_restart_countdown_secs() -> u32 {
    5
}

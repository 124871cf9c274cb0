//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::limits::{CooldownConfig, LimitsConfig};
use super::security::RateLimitConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Output and argument limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    /// Per-actor command rate limiting.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name shown in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Display name of the console actor.
    #[serde(default = "default_console_name")]
    pub console_name: String,
    /// File the world is saved to by /save and /restart.
    #[serde(default = "default_world_file")]
    pub world_file: String,
    /// Directory world saves are written into.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            console_name: default_console_name(),
            world_file: default_world_file(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_server_name() -> String {
    "fishd".to_string()
}

fn default_console_name() -> String {
    "[scarlet]Server".to_string()
}

fn default_world_file() -> String {
    "1.msav".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Persistence locations.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Player records (JSON). When absent, records live in memory only.
    #[serde(default = "default_players_path")]
    pub players_path: Option<PathBuf>,
    /// Server settings such as the last restart time (JSON).
    #[serde(default = "default_settings_path")]
    pub settings_path: Option<PathBuf>,
    /// Append-only audit log (JSON Lines). When absent, entries are only kept
    /// on the player records.
    #[serde(default)]
    pub audit_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            players_path: default_players_path(),
            settings_path: default_settings_path(),
            audit_path: None,
        }
    }
}

fn default_players_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/players.json"))
}

fn default_settings_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/settings.json"))
}

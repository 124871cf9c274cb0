//! Persistence for player records and server settings.
//!
//! [`Persistence`] is the only seam between the engine and storage. The JSON
//! file store is used in production; the in-memory store backs tests and
//! runs without a data directory.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::state::PlayerRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Settings key holding the millisecond timestamp of the last restart.
pub const LAST_RESTART_KEY: &str = "lastRestart";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt data in {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait Persistence: Send + Sync {
    /// Every stored record. An empty store yields an empty list.
    async fn load_players(&self) -> Result<Vec<PlayerRecord>, DbError>;

    /// Replace the stored records with `records`.
    async fn save_players(&self, records: &[PlayerRecord]) -> Result<(), DbError>;

    async fn load_settings(&self) -> Result<HashMap<String, i64>, DbError>;

    async fn save_setting(&self, key: &str, value: i64) -> Result<(), DbError>;
}

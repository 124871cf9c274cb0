//! In-memory persistence. Nothing survives the process.

use super::{DbError, Persistence};
use crate::state::PlayerRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    players: Mutex<Vec<PlayerRecord>>,
    settings: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with records a test expects to be loaded.
    pub fn with_players(players: Vec<PlayerRecord>) -> Self {
        Self {
            players: Mutex::new(players),
            settings: Mutex::default(),
        }
    }

    pub fn with_setting(self, key: &str, value: i64) -> Self {
        self.settings.lock().insert(key.to_string(), value);
        self
    }

    pub fn saved_players(&self) -> Vec<PlayerRecord> {
        self.players.lock().clone()
    }

    pub fn setting(&self, key: &str) -> Option<i64> {
        self.settings.lock().get(key).copied()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn load_players(&self) -> Result<Vec<PlayerRecord>, DbError> {
        Ok(self.players.lock().clone())
    }

    async fn save_players(&self, records: &[PlayerRecord]) -> Result<(), DbError> {
        *self.players.lock() = records.to_vec();
        Ok(())
    }

    async fn load_settings(&self) -> Result<HashMap<String, i64>, DbError> {
        Ok(self.settings.lock().clone())
    }

    async fn save_setting(&self, key: &str, value: i64) -> Result<(), DbError> {
        self.settings.lock().insert(key.to_string(), value);
        Ok(())
    }
}

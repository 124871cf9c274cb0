//! JSON file persistence.
//!
//! Each file is rewritten whole through a temp file and rename, so a crash
//! mid-write leaves the previous version intact.

use super::{DbError, Persistence};
use crate::state::PlayerRecord;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct JsonStore {
    players_path: PathBuf,
    settings_path: PathBuf,
    /// Serializes writers; readers see either the old or the new file.
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(players_path: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            players_path: players_path.into(),
            settings_path: settings_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DbError> {
        match tokio::fs::read(path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| DbError::Corrupt {
                path: path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No data file yet");
                Ok(T::default())
            }
            Err(source) => Err(DbError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DbError> {
        let io_err = |source: std::io::Error| DbError::Io {
            path: path.display().to_string(),
            source,
        };
        let body = serde_json::to_vec_pretty(value)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl Persistence for JsonStore {
    async fn load_players(&self) -> Result<Vec<PlayerRecord>, DbError> {
        let records: Vec<PlayerRecord> = Self::read_or_default(&self.players_path).await?;
        info!(count = records.len(), path = %self.players_path.display(), "Loaded player records");
        Ok(records)
    }

    async fn save_players(&self, records: &[PlayerRecord]) -> Result<(), DbError> {
        let _guard = self.write_lock.lock().await;
        Self::write_atomic(&self.players_path, records).await?;
        debug!(count = records.len(), "Saved player records");
        Ok(())
    }

    async fn load_settings(&self) -> Result<HashMap<String, i64>, DbError> {
        Self::read_or_default(&self.settings_path).await
    }

    async fn save_setting(&self, key: &str, value: i64) -> Result<(), DbError> {
        let _guard = self.write_lock.lock().await;
        let mut settings: HashMap<String, i64> =
            Self::read_or_default(&self.settings_path).await?;
        settings.insert(key.to_string(), value);
        Self::write_atomic(&self.settings_path, &settings).await
    }
}

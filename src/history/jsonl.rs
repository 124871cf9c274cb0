//! Append-only JSON Lines audit sink.

use super::{AuditError, AuditSink, HistoryEntry};
use crate::state::PlayerId;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Serialize)]
struct Line<'a> {
    target_id: &'a PlayerId,
    #[serde(flatten)]
    entry: &'a HistoryEntry,
}

/// Writes one JSON object per line to a file opened in append mode.
pub struct JsonlSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlSink {
    async fn store(&self, target: &PlayerId, entry: &HistoryEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(&Line {
            target_id: target,
            entry,
        })?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

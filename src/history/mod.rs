//! Moderation audit log.
//!
//! Entries live on the target's record (so they persist with it) and are
//! additionally forwarded to an [`AuditSink`]. The append itself never fails;
//! sink errors are logged and swallowed.

use crate::state::{PlayerId, PlayerRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

pub mod jsonl;
pub mod noop;
pub mod types;

pub use jsonl::JsonlSink;
pub use noop::NoOpSink;
pub use types::{HistoryEntry, time_since};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// External destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn store(&self, target: &PlayerId, entry: &HistoryEntry) -> Result<(), AuditError>;
}

/// Order for [`AuditLog::read_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrder {
    OldestFirst,
    NewestFirst,
}

pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append an entry to `record`'s history.
    ///
    /// The caller holds the record's write lock, which serializes appends per
    /// target. Timestamps never go backwards within one target's history.
    pub async fn append(
        &self,
        record: &mut PlayerRecord,
        actor_name: &str,
        action: &str,
    ) -> HistoryEntry {
        let now = Utc::now();
        let time = match record.history().last() {
            Some(last) if last.time > now => last.time,
            _ => now,
        };
        let entry = HistoryEntry {
            actor: actor_name.to_string(),
            action: action.to_string(),
            target: record.name().to_string(),
            time,
        };
        record.push_history(entry.clone());

        if let Err(e) = self.sink.store(record.id(), &entry).await {
            error!(target_id = %record.id(), action, error = %e, "Failed to forward audit entry");
        }
        entry
    }

    /// All entries for one record, in the requested order.
    pub fn read_all(record: &PlayerRecord, order: HistoryOrder) -> Vec<HistoryEntry> {
        let mut entries = record.history().to_vec();
        if order == HistoryOrder::NewestFirst {
            entries.reverse();
        }
        entries
    }
}

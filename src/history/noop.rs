//! No-op audit sink.
//!
//! Used when no external audit destination is configured. Entries are still
//! kept on the player records.

use super::{AuditError, AuditSink, HistoryEntry};
use crate::state::PlayerId;
use async_trait::async_trait;

pub struct NoOpSink;

#[async_trait]
impl AuditSink for NoOpSink {
    async fn store(&self, _target: &PlayerId, _entry: &HistoryEntry) -> Result<(), AuditError> {
        Ok(())
    }
}

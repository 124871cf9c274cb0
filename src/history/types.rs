//! Type definitions for moderation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit entry, attached to the target's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Display name of the actor at the time of the action.
    pub actor: String,
    /// Verb phrase, e.g. "muted" or "set rank to mod for".
    pub action: String,
    /// Display name of the target at the time of the action.
    pub target: String,
    pub time: DateTime<Utc>,
}

impl HistoryEntry {
    /// Line shown by the history command.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        format!(
            "{} [yellow]{} {} [white]{}",
            self.actor,
            self.action,
            self.target,
            time_since(self.time, now)
        )
    }
}

/// Human-readable age of `then` relative to `now`.
pub fn time_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (n, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3599 => (secs / 60, "minute"),
        3600..=86_399 => (secs / 3600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

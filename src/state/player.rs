//! Per-identity player records.
//!
//! A [`PlayerRecord`] outlives any single session: it is created on first
//! join and persisted across restarts. Moderation fields can only be changed
//! from within `state`, so every transition goes through
//! [`Moderation`](super::Moderation) and leaves an audit entry behind.

use crate::caps::{Rank, RoleFlag};
use crate::history::HistoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to a player record.
pub type PlayerHandle = Arc<RwLock<PlayerRecord>>;

/// Stable identity token assigned by the game server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two independent moderation flags. `Free` is both being false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationState {
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub stopped: bool,
}

impl ModerationState {
    pub fn is_free(&self) -> bool {
        !self.muted && !self.stopped
    }
}

/// A persisted player record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    id: PlayerId,
    name: String,
    #[serde(default)]
    rank: Rank,
    #[serde(default)]
    flags: BTreeSet<RoleFlag>,
    #[serde(default)]
    moderation: ModerationState,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    last_seen_online: Option<DateTime<Utc>>,
    #[serde(default)]
    last_ip: Option<String>,
    #[serde(skip)]
    afk: bool,
    #[serde(skip)]
    online: bool,
}

impl PlayerRecord {
    /// A fresh record: rank `member`, no flags, free, empty history.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rank: Rank::default(),
            flags: BTreeSet::new(),
            moderation: ModerationState::default(),
            history: Vec::new(),
            last_seen_online: None,
            last_ip: None,
            afk: false,
            online: false,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Display name, markup included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name with markup tags stripped.
    pub fn cleaned_name(&self) -> String {
        clean_name(&self.name)
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn flags(&self) -> &BTreeSet<RoleFlag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: RoleFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn moderation(&self) -> ModerationState {
        self.moderation
    }

    pub fn is_muted(&self) -> bool {
        self.moderation.muted
    }

    pub fn is_stopped(&self) -> bool {
        self.moderation.stopped
    }

    pub fn is_afk(&self) -> bool {
        self.afk
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_seen_online(&self) -> Option<DateTime<Utc>> {
        self.last_seen_online
    }

    pub fn last_ip(&self) -> Option<&str> {
        self.last_ip.as_deref()
    }

    /// Name shown in-game: rank prefix, AFK marker, then the display name.
    pub fn decorated_name(&self) -> String {
        let mut out = String::new();
        if self.afk {
            out.push_str("[orange][AFK] ");
        }
        match self.rank {
            Rank::Manager | Rank::Admin => out.push_str("[scarlet]<A> "),
            Rank::Mod => out.push_str("[acid]<M> "),
            _ if self.has_flag(RoleFlag::Member) => out.push_str("[pink]<P> "),
            _ => {}
        }
        out.push_str("[white]");
        out.push_str(&self.name);
        out
    }

    /// Snapshot of the fields the permission policy reads.
    pub fn actor_info(&self) -> ActorInfo {
        ActorInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            rank: self.rank,
            flags: self.flags.clone(),
        }
    }

    // === Session mutators (not moderation, no audit) ===

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_online(&mut self, online: bool, now: DateTime<Utc>) {
        self.online = online;
        self.last_seen_online = Some(now);
        if !online {
            self.afk = false;
        }
    }

    pub(crate) fn set_last_ip(&mut self, ip: impl Into<String>) {
        self.last_ip = Some(ip.into());
    }

    pub(crate) fn toggle_afk(&mut self) -> bool {
        self.afk = !self.afk;
        self.afk
    }

    pub(crate) fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    // === Moderation mutators, reachable only through `state::Moderation` ===

    pub(super) fn set_muted(&mut self, muted: bool) {
        self.moderation.muted = muted;
    }

    pub(super) fn set_stopped(&mut self, stopped: bool) {
        self.moderation.stopped = stopped;
    }

    pub(super) fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    pub(super) fn set_flag(&mut self, flag: RoleFlag, value: bool) {
        if value {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }
}

/// Snapshot of an actor's identity and authority at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorInfo {
    pub id: PlayerId,
    pub name: String,
    pub rank: Rank,
    pub flags: BTreeSet<RoleFlag>,
}

impl ActorInfo {
    pub fn cleaned_name(&self) -> String {
        clean_name(&self.name)
    }
}

/// Strip `[tag]` color markup from a display name.
///
/// An unterminated `[` is kept literally.
pub fn clean_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail.find(']') {
            Some(close) if !tail[1..close].contains('[') => rest = &tail[close + 1..],
            _ => {
                out.push('[');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

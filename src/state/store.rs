//! Player store: every known identity, online or not.
//!
//! Records are individually locked so that unrelated players never contend.
//! A separate name index lets name searches run without touching any record
//! lock.

use super::player::{PlayerHandle, PlayerId, PlayerRecord, clean_name};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One row of a name search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: PlayerId,
    /// Last known display name, markup included.
    pub name: String,
}

/// Read-only view of known identities used by player resolution.
pub trait PlayerDirectory: Send + Sync {
    /// Record for an exact stable id, if one exists.
    fn get_by_stable_id(&self, id: &str) -> Option<PlayerHandle>;

    /// Case-insensitive substring match on cleaned names.
    fn search_by_name(&self, query: &str) -> Vec<DirectoryEntry>;

    /// Case-insensitive exact match on cleaned names.
    fn find_exact_name(&self, query: &str) -> Vec<DirectoryEntry>;
}

/// In-memory store of all player records.
#[derive(Default)]
pub struct PlayerStore {
    records: DashMap<PlayerId, PlayerHandle>,
    /// id -> (display name, cleaned lowercase name)
    names: DashMap<PlayerId, (String, String)>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted records.
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.index_name(record.id(), record.name());
            store
                .records
                .insert(record.id().clone(), Arc::new(RwLock::new(record)));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record handle without holding the map guard.
    pub fn get(&self, id: &PlayerId) -> Option<PlayerHandle> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Get or create the record for `id`. Returns the handle and whether it was created.
    pub fn get_or_create(&self, id: &PlayerId, name: &str) -> (PlayerHandle, bool) {
        let mut created = false;
        let handle = self
            .records
            .entry(id.clone())
            .or_insert_with(|| {
                created = true;
                Arc::new(RwLock::new(PlayerRecord::new(id.clone(), name)))
            })
            .value()
            .clone();
        if created {
            self.index_name(id, name);
        }
        (handle, created)
    }

    /// Update a player's display name in both the record and the index.
    pub async fn rename(&self, handle: &PlayerHandle, name: &str) {
        let mut record = handle.write().await;
        if record.name() != name {
            record.set_name(name);
            self.index_name(record.id(), name);
        }
    }

    fn index_name(&self, id: &PlayerId, name: &str) {
        self.names.insert(
            id.clone(),
            (name.to_string(), clean_name(name).to_lowercase()),
        );
    }

    /// All handles, in no particular order.
    pub fn handles(&self) -> Vec<PlayerHandle> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Handles of players currently online.
    pub async fn online(&self) -> Vec<PlayerHandle> {
        let mut out = Vec::new();
        for handle in self.handles() {
            if handle.read().await.is_online() {
                out.push(handle);
            }
        }
        out
    }

    /// Handles of every known player last seen at `ip`, ordered by id.
    pub async fn by_last_ip(&self, ip: &str) -> Vec<PlayerHandle> {
        let mut out = Vec::new();
        for handle in self.handles() {
            let record = handle.read().await;
            if record.last_ip() == Some(ip) {
                out.push((record.id().clone(), handle.clone()));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out.into_iter().map(|(_, h)| h).collect()
    }

    /// Clone every record for persistence, ordered by id.
    pub async fn snapshot(&self) -> Vec<PlayerRecord> {
        let mut out = Vec::with_capacity(self.records.len());
        for handle in self.handles() {
            out.push(handle.read().await.clone());
        }
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// Mark every record offline; used after loading from disk.
    pub async fn mark_all_offline(&self, now: DateTime<Utc>) {
        for handle in self.handles() {
            let mut record = handle.write().await;
            if record.is_online() {
                record.set_online(false, now);
            }
        }
    }

    fn matching(&self, pred: impl Fn(&str) -> bool) -> Vec<DirectoryEntry> {
        let mut out: Vec<DirectoryEntry> = self
            .names
            .iter()
            .filter(|e| pred(&e.value().1))
            .map(|e| DirectoryEntry {
                id: e.key().clone(),
                name: e.value().0.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

impl PlayerDirectory for PlayerStore {
    fn get_by_stable_id(&self, id: &str) -> Option<PlayerHandle> {
        self.get(&PlayerId::new(id))
    }

    fn search_by_name(&self, query: &str) -> Vec<DirectoryEntry> {
        let needle = clean_name(query).to_lowercase();
        self.matching(|name| name.contains(&needle))
    }

    fn find_exact_name(&self, query: &str) -> Vec<DirectoryEntry> {
        let needle = clean_name(query).to_lowercase();
        self.matching(|name| name == needle)
    }
}

//! Moderation state machine.
//!
//! Each player is in some combination of Muted and Stopped; the two flags are
//! independent. Every transition:
//!
//! - requires a `Cap<ModerateCap>` scoped to the target,
//! - re-checks the actor against the target's current rank under the
//!   target's write lock, so a promotion after the token was minted wins,
//! - checks and mutates under that lock,
//! - appends an audit entry under that same lock.
//!
//! A transition that would not change state fails with a conflict and leaves
//! no audit entry behind.

use super::player::{ActorInfo, PlayerHandle, PlayerId, PlayerRecord};
use crate::caps::{Cap, ModerateCap, Rank, RoleFlag, can_moderate};
use crate::game::World;
use crate::history::{AuditLog, HistoryEntry};
use crate::metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("Player \"{0}\" is already muted.")]
    AlreadyMuted(String),
    #[error("Player \"{0}\" is not muted.")]
    NotMuted(String),
    #[error("Player \"{0}\" is already stopped.")]
    AlreadyStopped(String),
    #[error("Player \"{0}\" is not stopped.")]
    NotStopped(String),
    #[error("Player \"{name}\" already has rank {rank}.")]
    SameRank { name: String, rank: Rank },
    #[error("Role flag {flag} is already {value} for player \"{name}\".")]
    SameFlag {
        name: String,
        flag: RoleFlag,
        value: bool,
    },
    #[error("You no longer have permission to moderate player \"{0}\".")]
    Unauthorized(String),
    #[error("capability scoped to {cap} used on {target}")]
    WrongTarget { cap: PlayerId, target: PlayerId },
}

/// Applies moderation transitions and their side effects.
pub struct Moderation {
    audit: Arc<AuditLog>,
    world: Arc<dyn World>,
}

impl Moderation {
    pub fn new(audit: Arc<AuditLog>, world: Arc<dyn World>) -> Self {
        Self { audit, world }
    }

    pub async fn mute(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if record.is_muted() {
            return Err(ModerationError::AlreadyMuted(record.cleaned_name()));
        }
        record.set_muted(true);
        Ok(self.log(&mut record, actor, "muted", "muted").await)
    }

    pub async fn unmute(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if !record.is_muted() {
            return Err(ModerationError::NotMuted(record.cleaned_name()));
        }
        record.set_muted(false);
        Ok(self.log(&mut record, actor, "unmuted", "unmuted").await)
    }

    /// Stop a player. Online players are frozen immediately; offline players
    /// are frozen when they next join.
    pub async fn stop(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if record.is_stopped() {
            return Err(ModerationError::AlreadyStopped(record.cleaned_name()));
        }
        record.set_stopped(true);
        if record.is_online() {
            self.world.freeze(record.id());
        }
        Ok(self.log(&mut record, actor, "stopped", "stopped").await)
    }

    pub async fn free(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if !record.is_stopped() {
            return Err(ModerationError::NotStopped(record.cleaned_name()));
        }
        record.set_stopped(false);
        if record.is_online() {
            self.world.unfreeze(record.id());
        }
        Ok(self.log(&mut record, actor, "freed", "freed").await)
    }

    pub async fn set_rank(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        rank: Rank,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if record.rank() == rank {
            return Err(ModerationError::SameRank {
                name: record.cleaned_name(),
                rank,
            });
        }
        record.set_rank(rank);
        self.refresh_name(&record);
        let action = format!("set rank to {rank} for");
        Ok(self.log(&mut record, actor, &action, "set_rank").await)
    }

    pub async fn set_flag(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        flag: RoleFlag,
        value: bool,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        if record.has_flag(flag) == value {
            return Err(ModerationError::SameFlag {
                name: record.cleaned_name(),
                flag,
                value,
            });
        }
        record.set_flag(flag, value);
        self.refresh_name(&record);
        let action = format!("set roleflag {flag} to {value} for");
        Ok(self.log(&mut record, actor, &action, "set_flag").await)
    }

    /// Record a one-shot punitive action (warn, kick, ip-ban) that does not
    /// change moderation state. The side effect is the caller's job.
    pub async fn record_action(
        &self,
        target: &PlayerHandle,
        actor: &ActorInfo,
        action: &str,
        cap: Cap<ModerateCap>,
    ) -> Result<HistoryEntry, ModerationError> {
        let mut record = target.write().await;
        check_scope(&cap, actor, &record)?;
        Ok(self.log(&mut record, actor, action, action).await)
    }

    /// Re-apply persisted restrictions to a player who just joined.
    pub async fn reapply_on_join(&self, target: &PlayerHandle) {
        let record = target.read().await;
        if record.is_stopped() {
            self.world.freeze(record.id());
            self.world
                .send_message(record.id(), "[scarlet]You are stopped and cannot move.");
        }
    }

    async fn log(
        &self,
        record: &mut PlayerRecord,
        actor: &ActorInfo,
        action: &str,
        kind: &str,
    ) -> HistoryEntry {
        let entry = self.audit.append(record, &actor.name, action).await;
        metrics::record_moderation(kind);
        info!(
            actor = %actor.name,
            actor_id = %actor.id,
            target = %record.name(),
            target_id = %record.id(),
            action,
            "Moderation action"
        );
        entry
    }

    fn refresh_name(&self, record: &PlayerRecord) {
        if record.is_online() {
            self.world.update_name(record.id(), &record.decorated_name());
        }
    }
}

/// Validate a token against the record it is about to be spent on. Must be
/// called with the record's write lock held.
fn check_scope(
    cap: &Cap<ModerateCap>,
    actor: &ActorInfo,
    record: &PlayerRecord,
) -> Result<(), ModerationError> {
    let scope = cap.scope();
    if &scope.target != record.id() {
        return Err(ModerationError::WrongTarget {
            cap: scope.target.clone(),
            target: record.id().clone(),
        });
    }
    if !can_moderate(actor, record.id(), record.rank(), scope.allow_self) {
        return Err(ModerationError::Unauthorized(record.cleaned_name()));
    }
    Ok(())
}

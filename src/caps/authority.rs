//! Capability Authority - the permission policy and capability mint.
//!
//! The two policy predicates are pure functions over snapshots of rank and
//! flag state. [`CapabilityAuthority`] wraps them, logs every grant and
//! denial, and is the only code that can construct a [`Cap`].

use super::ranks::{Perm, Rank, RoleFlag};
use super::tokens::{Cap, Capability, ModerateCap, ModerateScope, ServerCap};
use crate::state::{ActorInfo, PlayerHandle, PlayerId, PlayerRecord};
use tracing::{debug, trace};

/// Whether `actor` may invoke a command tagged with `perm`.
///
/// The `all-access` flag bypasses the tag entirely.
pub fn can_run(actor: &ActorInfo, perm: Perm) -> bool {
    actor.flags.contains(&RoleFlag::AllAccess) || perm.allows(actor.rank, &actor.flags)
}

/// Whether `actor` may moderate the player identified by `target_id`.
///
/// True iff the actor outranks the target, or holds `moderate-peers` and is
/// level with the target, or the target is the actor and `allow_self` is set.
pub fn can_moderate(
    actor: &ActorInfo,
    target_id: &PlayerId,
    target_rank: Rank,
    allow_self: bool,
) -> bool {
    let (a, b) = (actor.rank.level(), target_rank.level());
    a > b
        || (a == b && actor.flags.contains(&RoleFlag::ModeratePeers))
        || (allow_self && &actor.id == target_id)
}

/// Whether `actor` may grant or revoke `flag` on someone else.
///
/// Authority flags can only be handed out by a manager or by someone who
/// already holds the same flag; nobody can give away more than they have.
pub fn can_grant_flag(actor: &ActorInfo, flag: RoleFlag) -> bool {
    !flag.is_authority() || actor.rank == Rank::Manager || actor.flags.contains(&flag)
}

/// The sole minter of capability tokens.
pub struct CapabilityAuthority;

impl CapabilityAuthority {
    /// Request a token to moderate the player behind `target`.
    ///
    /// Takes the target's read lock briefly; the actor is a snapshot so no
    /// two player locks are ever held together.
    pub async fn request_moderate_cap(
        actor: &ActorInfo,
        target: &PlayerHandle,
        allow_self: bool,
    ) -> Option<Cap<ModerateCap>> {
        let record = target.read().await;
        Self::moderate_cap_for(actor, &record, allow_self)
    }

    /// Same as [`Self::request_moderate_cap`] for a record the caller already holds.
    pub fn moderate_cap_for(
        actor: &ActorInfo,
        target: &PlayerRecord,
        allow_self: bool,
    ) -> Option<Cap<ModerateCap>> {
        let scope = ModerateScope {
            target: target.id().clone(),
            allow_self,
        };
        if can_moderate(actor, &scope.target, target.rank(), allow_self) {
            Self::log_grant::<ModerateCap>(actor, &scope);
            Some(Cap::new(scope))
        } else {
            Self::log_denial::<ModerateCap>(actor, &scope);
            None
        }
    }

    /// Request a token for server-wide administrative operations.
    pub fn request_server_cap(actor: &ActorInfo) -> Option<Cap<ServerCap>> {
        if can_run(actor, Perm::Admin) {
            Self::log_grant::<ServerCap>(actor, &());
            Some(Cap::new(()))
        } else {
            Self::log_denial::<ServerCap>(actor, &());
            None
        }
    }

    fn log_grant<T: Capability>(actor: &ActorInfo, scope: &T::Scope)
    where
        T::Scope: std::fmt::Debug,
    {
        debug!(
            capability = T::NAME,
            actor = %actor.name,
            actor_id = %actor.id,
            scope = ?scope,
            "Capability granted"
        );
    }

    fn log_denial<T: Capability>(actor: &ActorInfo, scope: &T::Scope)
    where
        T::Scope: std::fmt::Debug,
    {
        trace!(
            capability = T::NAME,
            actor = %actor.name,
            actor_id = %actor.id,
            scope = ?scope,
            "Capability denied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn actor(id: &str, rank: Rank, flags: &[RoleFlag]) -> ActorInfo {
        ActorInfo {
            id: PlayerId::new(id),
            name: id.to_string(),
            rank,
            flags: flags.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn all_access_bypasses_every_tag() {
        let griefer = actor("g", Rank::Griefer, &[RoleFlag::AllAccess]);
        assert!(can_run(&griefer, Perm::Manager));
        assert!(!can_run(&actor("g", Rank::Griefer, &[]), Perm::NotGriefer));
    }

    #[test]
    fn moderation_requires_strictly_higher_rank() {
        let m = actor("m", Rank::Mod, &[]);
        assert!(can_moderate(&m, &PlayerId::new("t"), Rank::Trusted, false));
        assert!(!can_moderate(&m, &PlayerId::new("t"), Rank::Mod, false));
        assert!(!can_moderate(&m, &PlayerId::new("t"), Rank::Admin, true));
    }

    #[test]
    fn peer_override_allows_equal_rank() {
        let m = actor("m", Rank::Mod, &[RoleFlag::ModeratePeers]);
        assert!(can_moderate(&m, &PlayerId::new("t"), Rank::Mod, false));
        assert!(!can_moderate(&m, &PlayerId::new("t"), Rank::Admin, false));
    }

    #[test]
    fn self_moderation_depends_on_allow_self() {
        let m = actor("m", Rank::Mod, &[]);
        assert!(can_moderate(&m, &PlayerId::new("m"), Rank::Mod, true));
        assert!(!can_moderate(&m, &PlayerId::new("m"), Rank::Mod, false));
    }

    #[tokio::test]
    async fn authority_mints_scoped_tokens() {
        let target = std::sync::Arc::new(tokio::sync::RwLock::new(PlayerRecord::new(
            PlayerId::new("victim"),
            "Victim",
        )));
        let admin = actor("a", Rank::Admin, &[]);
        let cap = CapabilityAuthority::request_moderate_cap(&admin, &target, false)
            .await
            .expect("admin outranks member");
        assert_eq!(cap.scope().target, PlayerId::new("victim"));
        assert!(!cap.scope().allow_self);

        let member = actor("b", Rank::Member, &[]);
        assert!(
            CapabilityAuthority::request_moderate_cap(&member, &target, false)
                .await
                .is_none()
        );
    }

    #[test]
    fn authority_flags_are_only_granted_by_holders_or_managers() {
        let m = actor("m", Rank::Mod, &[]);
        assert!(can_grant_flag(&m, RoleFlag::Member));
        assert!(!can_grant_flag(&m, RoleFlag::AllAccess));
        assert!(!can_grant_flag(&m, RoleFlag::ModeratePeers));

        let peer_mod = actor("k", Rank::Mod, &[RoleFlag::ModeratePeers]);
        assert!(can_grant_flag(&peer_mod, RoleFlag::ModeratePeers));
        assert!(!can_grant_flag(&peer_mod, RoleFlag::AllAccess));

        let manager = actor("x", Rank::Manager, &[]);
        assert!(can_grant_flag(&manager, RoleFlag::AllAccess));
    }

    #[test]
    fn server_cap_requires_admin() {
        assert!(CapabilityAuthority::request_server_cap(&actor("a", Rank::Admin, &[])).is_some());
        assert!(CapabilityAuthority::request_server_cap(&actor("m", Rank::Mod, &[])).is_none());
    }
}

//! Core capability token types.
//!
//! A `Cap<T>` proves that the permission policy approved one specific action
//! against one specific target. Moderation transitions take the token by value.

use crate::state::PlayerId;
use std::fmt;
use std::marker::PhantomData;

/// An unforgeable capability token.
///
/// Only [`CapabilityAuthority`](super::authority::CapabilityAuthority) can mint
/// tokens: `new()` is `pub(super)`. The type is deliberately neither `Clone`
/// nor `Copy`, so a token is spent by the one transition it was issued for.
pub struct Cap<T: Capability> {
    scope: T::Scope,
    _marker: PhantomData<T>,
}

impl<T: Capability> Cap<T> {
    #[inline]
    pub(super) fn new(scope: T::Scope) -> Self {
        Self {
            scope,
            _marker: PhantomData,
        }
    }

    /// The resource this token authorizes.
    #[inline]
    pub fn scope(&self) -> &T::Scope {
        &self.scope
    }

    #[inline]
    pub fn into_scope(self) -> T::Scope {
        self.scope
    }
}

impl<T: Capability> fmt::Debug for Cap<T>
where
    T::Scope: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cap")
            .field("capability", &T::NAME)
            .field("scope", &self.scope)
            .finish()
    }
}

impl<T: Capability> fmt::Display for Cap<T>
where
    T::Scope: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cap<{}>({})", T::NAME, self.scope)
    }
}

/// Trait for capability types.
pub trait Capability: 'static + Send + Sync {
    /// The type of resource this capability is scoped to.
    type Scope: Clone + Send + Sync;

    /// Human-readable name of this capability (for logging).
    const NAME: &'static str;
}

/// Permission to moderate one player: mute, stop, rank and flag changes,
/// and one-shot punitive actions.
pub struct ModerateCap;

impl Capability for ModerateCap {
    type Scope = ModerateScope;
    const NAME: &'static str = "player:moderate";
}

/// The target a [`ModerateCap`] was minted for, and whether the grant relied
/// on self-moderation being allowed. Transitions re-run the policy with the
/// same `allow_self` against the target's current rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerateScope {
    pub target: PlayerId,
    pub allow_self: bool,
}

impl fmt::Display for ModerateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target.as_str())
    }
}

/// Permission to run server-wide destructive operations (restart).
pub struct ServerCap;

impl Capability for ServerCap {
    type Scope = ();
    const NAME: &'static str = "server:admin";
}

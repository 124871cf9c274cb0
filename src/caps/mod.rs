//! Ranks, role flags, and capability-based permissions.
//!
//! Instead of scattered rank comparisons, state transitions require a
//! `Cap<T>` token that only [`CapabilityAuthority`] can mint. The policy
//! predicates [`can_run`] and [`can_moderate`] are pure and exported for
//! callers that only need a yes/no answer.

mod authority;
mod ranks;
mod tokens;

pub use authority::{CapabilityAuthority, can_grant_flag, can_moderate, can_run};
pub use ranks::{Perm, Rank, RoleFlag};
pub use tokens::{Cap, Capability, ModerateCap, ModerateScope, ServerCap};

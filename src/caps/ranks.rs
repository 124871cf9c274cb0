//! Rank and role-flag tables plus the permission tags commands are gated on.
//!
//! Both tables are closed enums: they are fixed at compile time and can only
//! be read at runtime. Lookup by name is case-insensitive.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A player's tier. Comparison is by [`Rank::level`] only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Griefer,
    #[default]
    Member,
    Trusted,
    Mod,
    Admin,
    Manager,
}

impl Rank {
    /// Every rank, lowest first.
    pub const ALL: [Rank; 6] = [
        Rank::Griefer,
        Rank::Member,
        Rank::Trusted,
        Rank::Mod,
        Rank::Admin,
        Rank::Manager,
    ];

    /// Numeric level; unique per rank.
    pub const fn level(self) -> i32 {
        match self {
            Rank::Griefer => -1,
            Rank::Member => 0,
            Rank::Trusted => 1,
            Rank::Mod => 2,
            Rank::Admin => 3,
            Rank::Manager => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Rank::Griefer => "griefer",
            Rank::Member => "member",
            Rank::Trusted => "trusted",
            Rank::Mod => "mod",
            Rank::Admin => "admin",
            Rank::Manager => "manager",
        }
    }

    /// Look up a rank by name.
    pub fn by_name(name: &str) -> Option<Rank> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// Whether this rank is at or above `other`.
    #[inline]
    pub fn at_least(self, other: Rank) -> bool {
        self.level() >= other.level()
    }

    pub fn is_staff(self) -> bool {
        self.at_least(Rank::Mod)
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A boolean capability held independently of rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleFlag {
    /// Paid membership; unlocks the member command group.
    Member,
    /// Allows moderating players of the same rank.
    ModeratePeers,
    /// Bypasses command permission tags entirely.
    AllAccess,
}

impl RoleFlag {
    pub const ALL: [RoleFlag; 3] = [RoleFlag::Member, RoleFlag::ModeratePeers, RoleFlag::AllAccess];

    pub const fn name(self) -> &'static str {
        match self {
            RoleFlag::Member => "member",
            RoleFlag::ModeratePeers => "moderate-peers",
            RoleFlag::AllAccess => "all-access",
        }
    }

    /// Whether the flag widens what its holder is authorized to do, as
    /// opposed to a cosmetic or membership marker.
    pub const fn is_authority(self) -> bool {
        matches!(self, RoleFlag::ModeratePeers | RoleFlag::AllAccess)
    }

    /// Look up a flag by name. Underscores are accepted in place of dashes.
    pub fn by_name(name: &str) -> Option<RoleFlag> {
        let name = name.trim().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(&name))
    }
}

impl fmt::Display for RoleFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Permission tag attached to every command definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perm {
    /// Anyone, griefers included.
    All,
    /// Anyone at `member` rank or above.
    NotGriefer,
    /// Holders of the `member` flag, and staff.
    Member,
    Mod,
    Admin,
    Manager,
}

impl Perm {
    /// Evaluate the tag against a rank and flag set.
    ///
    /// The `all-access` override is applied by the policy, not here.
    pub fn allows(self, rank: Rank, flags: &BTreeSet<RoleFlag>) -> bool {
        match self {
            Perm::All => true,
            Perm::NotGriefer => rank.at_least(Rank::Member),
            Perm::Member => flags.contains(&RoleFlag::Member) || rank.at_least(Rank::Mod),
            Perm::Mod => rank.at_least(Rank::Mod),
            Perm::Admin => rank.at_least(Rank::Admin),
            Perm::Manager => rank.at_least(Rank::Manager),
        }
    }

    /// Name used in help sections and denial messages.
    pub const fn name(self) -> &'static str {
        match self {
            Perm::All => "all",
            Perm::NotGriefer => "not griefer",
            Perm::Member => "member",
            Perm::Mod => "mod",
            Perm::Admin => "admin",
            Perm::Manager => "manager",
        }
    }
}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

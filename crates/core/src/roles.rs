//! Role names and the rank hierarchy used for authorization.
//!
//! Names must match the `ck_users_role` constraint in the initial migration.

use serde::{Deserialize, Serialize};

pub const ROLE_ADMINISTRATOR: &str = "Administrator";
pub const ROLE_USER: &str = "User";
pub const ROLE_COMMENTER: &str = "Commenter";

/// A principal's role. Ordering follows rank: `Commenter < User < Administrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Commenter,
    User,
    Administrator,
}

impl Role {
    /// Return the role name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => ROLE_ADMINISTRATOR,
            Self::User => ROLE_USER,
            Self::Commenter => ROLE_COMMENTER,
        }
    }

    /// Parse a role name. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ROLE_ADMINISTRATOR => Some(Self::Administrator),
            ROLE_USER => Some(Self::User),
            ROLE_COMMENTER => Some(Self::Commenter),
            _ => None,
        }
    }

    /// Numeric rank: Administrator = 3, User = 2, Commenter = 1.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Administrator => 3,
            Self::User => 2,
            Self::Commenter => 1,
        }
    }

    /// Whether this role satisfies a requirement of "at least `required`".
    pub fn satisfies(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub const ALL: &'static [&'static str] = &[ROLE_ADMINISTRATOR, ROLE_USER, ROLE_COMMENTER];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered() {
        assert!(Role::Administrator.rank() > Role::User.rank());
        assert!(Role::User.rank() > Role::Commenter.rank());
        assert!(Role::Administrator > Role::Commenter);
    }

    #[test]
    fn satisfies_is_rank_comparison() {
        assert!(Role::Administrator.satisfies(Role::User));
        assert!(Role::User.satisfies(Role::User));
        assert!(Role::User.satisfies(Role::Commenter));
        assert!(!Role::Commenter.satisfies(Role::User));
        assert!(!Role::User.satisfies(Role::Administrator));
    }

    #[test]
    fn parse_round_trips_names() {
        for name in Role::ALL {
            let role = Role::parse(name).expect("known role");
            assert_eq!(role.as_str(), *name);
        }
        assert_eq!(Role::parse("admin"), None);
    }
}

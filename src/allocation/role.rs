//! Role: the eight behavioural castes a population is split into

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Scout,
    Gatherer,
    Builder,
    Guardian,
    Hunter,
    Healer,
    Messenger,
    Wanderer,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Scout,
        Role::Gatherer,
        Role::Builder,
        Role::Guardian,
        Role::Hunter,
        Role::Healer,
        Role::Messenger,
        Role::Wanderer,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The role `offset` places further along, wrapping. `offset % 8 == 0` is `self`.
    pub fn shifted(self, offset: usize) -> Role {
        Self::ALL[(self.index() + offset) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Scout => "scout",
            Role::Gatherer => "gatherer",
            Role::Builder => "builder",
            Role::Guardian => "guardian",
            Role::Hunter => "hunter",
            Role::Healer => "healer",
            Role::Messenger => "messenger",
            Role::Wanderer => "wanderer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_table() {
        for (i, role) in Role::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn test_shifted_wraps() {
        assert_eq!(Role::Wanderer.shifted(1), Role::Scout);
        assert_eq!(Role::Builder.shifted(8), Role::Builder);
        assert_ne!(Role::Healer.shifted(3), Role::Healer);
    }
}

//! RarityTier: weighted outcome classes of a milestone mutation

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl RarityTier {
    /// Ordered from most to least frequent
    pub const ALL: [RarityTier; 6] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
        RarityTier::Mythic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Relative draw weight
    pub fn weight(self) -> u32 {
        match self {
            RarityTier::Common => 50,
            RarityTier::Uncommon => 25,
            RarityTier::Rare => 12,
            RarityTier::Epic => 8,
            RarityTier::Legendary => 4,
            RarityTier::Mythic => 1,
        }
    }

    /// Probability that a second organism is affected (5% .. 25%)
    pub fn second_target_chance(self) -> f64 {
        0.05 + 0.04 * self.index() as f64
    }

    /// Fraction of a field's range added by an attribute boost
    pub fn boost_fraction(self) -> f64 {
        match self {
            RarityTier::Common => 0.05,
            RarityTier::Uncommon => 0.08,
            RarityTier::Rare => 0.12,
            RarityTier::Epic => 0.18,
            RarityTier::Legendary => 0.25,
            RarityTier::Mythic => 0.35,
        }
    }

    /// Members added by a count increase
    pub fn count_bonus(self) -> u32 {
        match self {
            RarityTier::Common | RarityTier::Uncommon => 1,
            RarityTier::Rare => 2,
            RarityTier::Epic => 3,
            RarityTier::Legendary => 5,
            RarityTier::Mythic => 8,
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_decrease_with_rarity() {
        for pair in RarityTier::ALL.windows(2) {
            assert!(pair[0].weight() > pair[1].weight());
            assert!(pair[0].boost_fraction() < pair[1].boost_fraction());
        }
    }

    #[test]
    fn test_second_target_chance_bounds() {
        assert!((RarityTier::Common.second_target_chance() - 0.05).abs() < 1e-12);
        assert!((RarityTier::Mythic.second_target_chance() - 0.25).abs() < 1e-12);
    }
}

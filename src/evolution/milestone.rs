//! Milestone: confirmation-count thresholds that gate mutation
//!
//! Each milestone carries a trigger chance and a permitted tier set. Higher
//! milestones only permit rarer tiers: milestone `k` permits tiers `k..`,
//! so every lower milestone's set is a superset of every higher one's.

use super::RarityTier;
use crate::rng::RngState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Milestone {
    TenThousand,
    FiftyThousand,
    OneHundredThousand,
    TwoHundredFiftyThousand,
    FiveHundredThousand,
    OneMillion,
}

impl Milestone {
    /// Ascending threshold order
    pub const ALL: [Milestone; 6] = [
        Milestone::TenThousand,
        Milestone::FiftyThousand,
        Milestone::OneHundredThousand,
        Milestone::TwoHundredFiftyThousand,
        Milestone::FiveHundredThousand,
        Milestone::OneMillion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn threshold(self) -> u64 {
        match self {
            Milestone::TenThousand => 10_000,
            Milestone::FiftyThousand => 50_000,
            Milestone::OneHundredThousand => 100_000,
            Milestone::TwoHundredFiftyThousand => 250_000,
            Milestone::FiveHundredThousand => 500_000,
            Milestone::OneMillion => 1_000_000,
        }
    }

    pub fn from_threshold(threshold: u64) -> Option<Milestone> {
        Self::ALL.into_iter().find(|m| m.threshold() == threshold)
    }

    /// Probability that a hit on this milestone mutates anything
    pub fn chance(self) -> f64 {
        match self {
            Milestone::TenThousand => 0.01,
            Milestone::FiftyThousand => 0.05,
            Milestone::OneHundredThousand => 0.10,
            Milestone::TwoHundredFiftyThousand => 0.25,
            Milestone::FiveHundredThousand => 0.50,
            Milestone::OneMillion => 1.00,
        }
    }

    pub fn permitted_tiers(self) -> &'static [RarityTier] {
        &RarityTier::ALL[self.index()..]
    }

    /// Boundary crossed when the count moves from `previous` to `current`.
    ///
    /// The highest multiple of the threshold in `(previous, current]`. With
    /// no previous observation only an exact multiple counts.
    pub fn crossed(self, previous: Option<u64>, current: u64) -> Option<u64> {
        let threshold = self.threshold();
        match previous {
            None => (current > 0 && current % threshold == 0).then_some(current),
            Some(prev) => {
                let boundary = current / threshold * threshold;
                (boundary > 0 && boundary > prev).then_some(boundary)
            }
        }
    }

    /// Weighted tier draw restricted to the permitted set (one draw)
    pub fn roll_tier(self, rng: &mut RngState) -> RarityTier {
        let tiers = self.permitted_tiers();
        let total: u32 = tiers.iter().map(|t| t.weight()).sum();
        let mut pick = rng.below(total);
        for tier in tiers {
            if pick < tier.weight() {
                return *tier;
            }
            pick -= tier.weight();
        }
        RarityTier::Mythic
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} confirmations", self.threshold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_permitted_tiers_are_monotonic() {
        for low in Milestone::ALL {
            for high in Milestone::ALL.iter().filter(|m| m.threshold() > low.threshold()) {
                let low_set: HashSet<_> = low.permitted_tiers().iter().collect();
                assert!(high.permitted_tiers().iter().all(|t| low_set.contains(t)));
            }
        }
        assert_eq!(Milestone::TenThousand.permitted_tiers(), &RarityTier::ALL[..]);
        assert_eq!(Milestone::OneMillion.permitted_tiers(), &[RarityTier::Mythic]);
    }

    #[test]
    fn test_crossing_detection() {
        let m = Milestone::TenThousand;
        assert_eq!(m.crossed(Some(9_999), 10_000), Some(10_000));
        assert_eq!(m.crossed(Some(10_000), 10_000), None);
        assert_eq!(m.crossed(Some(10_000), 19_999), None);
        assert_eq!(m.crossed(Some(9_000), 31_000), Some(30_000));
        assert_eq!(m.crossed(None, 20_000), Some(20_000));
        assert_eq!(m.crossed(None, 20_001), None);
        assert_eq!(m.crossed(None, 0), None);
        assert_eq!(Milestone::OneMillion.crossed(Some(999_999), 1_000_000), Some(1_000_000));
    }

    #[test]
    fn test_roll_tier_respects_restriction() {
        let mut rng = RngState::seed(42u32);
        for milestone in Milestone::ALL {
            for _ in 0..500 {
                let tier = milestone.roll_tier(&mut rng);
                assert!(milestone.permitted_tiers().contains(&tier));
            }
        }
    }

    #[test]
    fn test_roll_tier_favours_common() {
        let mut rng = RngState::seed(7u32);
        let commons = (0..1_000)
            .filter(|_| Milestone::TenThousand.roll_tier(&mut rng) == RarityTier::Common)
            .count();
        assert!(commons > 350 && commons < 650, "commons = {commons}");
    }

    #[test]
    fn test_from_threshold() {
        assert_eq!(Milestone::from_threshold(250_000), Some(Milestone::TwoHundredFiftyThousand));
        assert_eq!(Milestone::from_threshold(12), None);
    }
}

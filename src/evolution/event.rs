//! Mutation kinds, selection policy and the events handed to observers

use super::{Milestone, RarityTier};
use crate::genome::MutationRecord;
use crate::population::OrganismId;
use crate::rng::{RngState, Seed};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a milestone mutation does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Raise one numeric trait by a rarity-scaled share of its range
    AttributeBoost,
    /// Move the organism to a different role
    RoleChange,
    /// Grow the organism's group
    CountIncrease,
    /// Halve the group and spawn the other half as a child organism
    GroupSplit,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [
        MutationKind::AttributeBoost,
        MutationKind::RoleChange,
        MutationKind::CountIncrease,
        MutationKind::GroupSplit,
    ];
}

/// How the mutation kind is chosen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationPolicy {
    #[default]
    Uniform,
    /// Relative weights in `MutationKind::ALL` order
    Weighted([u32; 4]),
}

impl MutationPolicy {
    /// Sum of the weights, or `None` when it does not fit in a `u32`
    pub fn total_weight(weights: &[u32; 4]) -> Option<u32> {
        weights.iter().try_fold(0u32, |acc, w| acc.checked_add(*w))
    }

    /// One draw. All-zero or overflowing weights fall back to uniform.
    pub fn pick(&self, rng: &mut RngState) -> MutationKind {
        let weighted = match self {
            MutationPolicy::Weighted(weights) => {
                Self::total_weight(weights).filter(|t| *t > 0).map(|t| (weights, t))
            }
            MutationPolicy::Uniform => None,
        };
        match weighted {
            Some((weights, total)) => {
                let mut pick = rng.below(total);
                for (kind, weight) in MutationKind::ALL.iter().zip(weights) {
                    if pick < *weight {
                        return *kind;
                    }
                    pick -= weight;
                }
                MutationKind::GroupSplit
            }
            None => MutationKind::ALL[rng.below(MutationKind::ALL.len() as u32) as usize],
        }
    }
}

/// Child organism the population should spawn after a group split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub parent: OrganismId,
    pub members: u32,
    pub seed: Seed,
}

/// One applied milestone mutation, for the notification/visual layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub organism_id: OrganismId,
    pub milestone: Milestone,
    /// Confirmation count at which the milestone boundary lies
    pub boundary: u64,
    pub nonce: Seed,
    pub tier: RarityTier,
    pub kind: MutationKind,
    /// True for the optional second organism of a roll
    pub secondary: bool,
    pub records: Vec<MutationRecord>,
    pub split: Option<SplitRequest>,
    pub timestamp: DateTime<Utc>,
}

impl MutationEvent {
    pub fn summary(&self) -> String {
        format!(
            "{} {:?} on {} at {} ({}){}",
            self.tier,
            self.kind,
            self.organism_id,
            self.boundary,
            self.milestone,
            if self.secondary { " [secondary]" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_reaches_every_kind() {
        let mut rng = RngState::seed(1u32);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(MutationPolicy::Uniform.pick(&mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_weighted_policy() {
        let mut rng = RngState::seed(2u32);
        let only_boost = MutationPolicy::Weighted([1, 0, 0, 0]);
        for _ in 0..100 {
            assert_eq!(only_boost.pick(&mut rng), MutationKind::AttributeBoost);
        }
        let only_split = MutationPolicy::Weighted([0, 0, 0, 3]);
        assert_eq!(only_split.pick(&mut rng), MutationKind::GroupSplit);
        // degenerate weights behave like uniform
        let _ = MutationPolicy::Weighted([0, 0, 0, 0]).pick(&mut rng);
    }

    #[test]
    fn test_overflowing_weights_do_not_panic() {
        let weights = [u32::MAX, 1, 0, 0];
        assert_eq!(MutationPolicy::total_weight(&weights), None);
        assert_eq!(MutationPolicy::total_weight(&[u32::MAX - 1, 1, 0, 0]), Some(u32::MAX));

        let mut rng = RngState::seed(9u32);
        let policy = MutationPolicy::Weighted(weights);
        for _ in 0..50 {
            assert!(MutationKind::ALL.contains(&policy.pick(&mut rng)));
        }
    }
}

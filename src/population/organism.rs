//! Organism: one evolving entity and its genome
//!
//! Identity is derived from the seed, the creation time and a per-population
//! sequence number. Parents are referenced by id only.

use crate::allocation::Role;
use crate::evolution::Milestone;
use crate::genome::TraitSet;
use crate::rng::Seed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of an organism
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrganismId(String);

impl OrganismId {
    /// First 16 hex digits of `SHA-256(seed || created_at || sequence)`
    pub fn derive(seed: Seed, created_at: DateTime<Utc>, sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.value().to_le_bytes());
        hasher.update(created_at.timestamp_micros().to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub seed: Seed,
    pub role: Role,
    /// Particles in this organism's group
    pub members: u32,
    pub traits: TraitSet,
    pub parent_ids: Vec<OrganismId>,
    pub created_at: DateTime<Utc>,
    /// Nonce last evaluated per milestone
    evaluated: BTreeMap<Milestone, Seed>,
}

impl Organism {
    pub fn new(seed: Seed, role: Role, traits: TraitSet, sequence: u64) -> Self {
        let created_at = Utc::now();
        Self {
            id: OrganismId::derive(seed, created_at, sequence),
            seed,
            role,
            members: 1,
            traits,
            parent_ids: Vec::new(),
            created_at,
            evaluated: BTreeMap::new(),
        }
    }

    pub fn with_parents(mut self, parents: Vec<OrganismId>) -> Self {
        self.parent_ids = parents;
        self
    }

    pub fn with_members(mut self, members: u32) -> Self {
        self.members = members.max(1);
        self
    }

    pub fn is_genesis(&self) -> bool {
        self.parent_ids.is_empty()
    }

    /// Nonce this organism was last evaluated with at `milestone`
    pub fn last_seed_for(&self, milestone: Milestone) -> Option<Seed> {
        self.evaluated.get(&milestone).copied()
    }

    pub(crate) fn mark_evaluated(&mut self, milestone: Milestone, nonce: Seed) {
        self.evaluated.insert(milestone, nonce);
    }

    pub fn summary(&self) -> String {
        format!(
            "Organism {} | {} x{} | seed={} | {}",
            self.id,
            self.role,
            self.members,
            self.seed,
            self.traits.summary()
        )
    }
}

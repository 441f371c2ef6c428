//! TraitGenerator: seed-to-genome derivation, inheritance and drift
//!
//! Genesis derives one sub-stream per category from the seed and spends
//! exactly one draw per field (a colour channel counts as a field). Draw
//! order follows the struct declaration order, so the mapping from seed to
//! traits can be audited by replaying the sub-streams by hand.

use super::{
    Color, MutatedField, MutationRecord, Shape, TraitCategory, TraitField, TraitSet, TraitValue,
};
use crate::error::{ChainbornError, Result};
use crate::evolution::{Milestone, RarityTier};
use crate::rng::{RngState, Seed};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Inclusive channel range of primary colours
pub const PRIMARY_CHANNEL: (u8, u8) = (64, 255);
/// Inclusive channel range of secondary colours
pub const SECONDARY_CHANNEL: (u8, u8) = (32, 223);

/// Tuning for trait generation and ambient drift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Per-field probability used by ambient drift passes
    pub mutation_rate: f64,
    /// How far an inherited field moves toward the parents' mean (0 = ignore parents)
    pub inheritance_weight: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.05,
            inheritance_weight: 0.6,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ChainbornError::Configuration(format!(
                "mutation_rate {} outside [0, 1]",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.inheritance_weight) {
            return Err(ChainbornError::Configuration(format!(
                "inheritance_weight {} outside [0, 1]",
                self.inheritance_weight
            )));
        }
        Ok(())
    }
}

/// Derives and mutates trait sets
#[derive(Debug, Clone, Default)]
pub struct TraitGenerator {
    config: GeneratorConfig,
}

impl TraitGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Number of draws genesis spends on a category
    pub fn draws_for(category: TraitCategory) -> usize {
        match category {
            // six colour channels + size, opacity, shape, density, glow
            TraitCategory::Visual => 11,
            TraitCategory::Behavioral => 6,
            TraitCategory::Physical => 5,
            TraitCategory::Evolutionary => 4,
        }
    }

    /// Derive a fresh trait set from a seed.
    ///
    /// Categories not listed keep their declared defaults and consume no draws.
    pub fn generate_genesis(&self, seed: Seed, categories: &[TraitCategory]) -> TraitSet {
        let root = RngState::seed(seed);
        let mut traits = TraitSet::default();
        for category in TraitCategory::ALL {
            if !categories.contains(&category) {
                continue;
            }
            let mut rng = root.derive(category.name());
            match category {
                TraitCategory::Visual => Self::fill_visual(&mut traits, &mut rng),
                TraitCategory::Behavioral => Self::fill_fields(
                    &mut traits,
                    &mut rng,
                    &[
                        TraitField::Speed,
                        TraitField::Aggression,
                        TraitField::Sociability,
                        TraitField::Curiosity,
                        TraitField::Efficiency,
                        TraitField::Adaptability,
                    ],
                ),
                TraitCategory::Physical => Self::fill_fields(
                    &mut traits,
                    &mut rng,
                    &[
                        TraitField::Mass,
                        TraitField::CollisionRadius,
                        TraitField::EnergyCapacity,
                        TraitField::Durability,
                        TraitField::Regeneration,
                    ],
                ),
                TraitCategory::Evolutionary => Self::fill_fields(
                    &mut traits,
                    &mut rng,
                    &[
                        TraitField::Fitness,
                        TraitField::Stability,
                        TraitField::Reproductivity,
                        TraitField::Longevity,
                    ],
                ),
            }
        }
        traits
    }

    /// Genesis from `seed`, then blended toward the parents.
    ///
    /// Numeric fields move toward the parents' mean by `inheritance_weight`;
    /// shape and primary colour come from one parent picked by the
    /// `"inheritance"` sub-stream. Generation is one past the oldest parent.
    pub fn generate_inherited(&self, seed: Seed, parents: &[&TraitSet]) -> TraitSet {
        let mut child = self.generate_genesis(seed, &TraitCategory::ALL);
        if parents.is_empty() {
            return child;
        }

        let weight = self.config.inheritance_weight;
        let count = parents.len() as f64;
        for field in TraitField::ALL {
            let mean = parents.iter().map(|p| p.get(field)).sum::<f64>() / count;
            let own = child.get(field);
            child.set(field, own * (1.0 - weight) + mean * weight);
        }

        let mut rng = RngState::seed(seed).derive("inheritance");
        let donor = parents[rng.below(parents.len() as u32) as usize];
        child.visual.shape = donor.visual.shape;
        child.visual.primary_color = donor.visual.primary_color;

        let oldest = parents
            .iter()
            .map(|p| p.evolutionary.generation)
            .max()
            .unwrap_or(0);
        child.evolutionary.generation = oldest.saturating_add(1);
        child
    }

    /// Ambient drift: returns the mutated copy and the records applied to it
    pub fn mutate(
        &self,
        traits: &TraitSet,
        mutation_rate: f64,
        rng: &mut RngState,
        milestone: Option<Milestone>,
    ) -> (TraitSet, Vec<MutationRecord>) {
        let mut next = traits.clone();
        let records = self.mutate_in_place(&mut next, mutation_rate, rng, milestone);
        (next, records)
    }

    /// In-place variant of `mutate`.
    ///
    /// Every numeric field rolls once against `mutation_rate`; a hit draws a
    /// delta within the field's variance and clamps. Shape rolls last.
    /// Generation is incremented whether or not anything changed.
    pub fn mutate_in_place(
        &self,
        traits: &mut TraitSet,
        mutation_rate: f64,
        rng: &mut RngState,
        milestone: Option<Milestone>,
    ) -> Vec<MutationRecord> {
        let now = Utc::now();
        let mut records = Vec::new();

        for field in TraitField::ALL {
            if !rng.chance(mutation_rate) {
                continue;
            }
            let spec = field.spec();
            let delta = rng.range_f64(-spec.variance, spec.variance);
            let old = traits.get(field);
            let new = traits.set(field, old + delta);
            if new != old {
                records.push(MutationRecord::new(
                    MutatedField::Trait(field),
                    TraitValue::Number(old),
                    TraitValue::Number(new),
                    milestone,
                    RarityTier::Common,
                    now,
                ));
            }
        }

        if rng.chance(mutation_rate) {
            let old = traits.visual.shape;
            let offset = 1 + rng.below(Shape::ALL.len() as u32 - 1) as usize;
            let new = Shape::ALL[(old.index() + offset) % Shape::ALL.len()];
            traits.visual.shape = new;
            records.push(MutationRecord::new(
                MutatedField::Shape,
                TraitValue::Shape(old),
                TraitValue::Shape(new),
                milestone,
                RarityTier::Common,
                now,
            ));
        }

        traits.evolutionary.generation = traits.evolutionary.generation.saturating_add(1);

        let start = traits.history.len();
        traits.history.extend(records);
        traits.history.records()[start..].to_vec()
    }

    fn fill_visual(traits: &mut TraitSet, rng: &mut RngState) {
        let (plo, phi) = PRIMARY_CHANNEL;
        let (slo, shi) = SECONDARY_CHANNEL;
        let v = &mut traits.visual;
        v.primary_color = Color {
            r: Color::channel(rng.draw(), plo, phi),
            g: Color::channel(rng.draw(), plo, phi),
            b: Color::channel(rng.draw(), plo, phi),
        };
        v.secondary_color = Color {
            r: Color::channel(rng.draw(), slo, shi),
            g: Color::channel(rng.draw(), slo, shi),
            b: Color::channel(rng.draw(), slo, shi),
        };
        v.size = TraitField::Size.spec().lerp(rng.next_f64());
        v.opacity = TraitField::Opacity.spec().lerp(rng.next_f64());
        v.shape = Shape::from_draw(rng.draw());
        v.density = TraitField::Density.spec().lerp(rng.next_f64());
        v.glow = TraitField::Glow.spec().lerp(rng.next_f64());
    }

    fn fill_fields(traits: &mut TraitSet, rng: &mut RngState, fields: &[TraitField]) {
        for field in fields {
            let value = field.spec().lerp(rng.next_f64());
            traits.set(*field, value);
        }
    }
}

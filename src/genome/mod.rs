//! Genome: organism traits, their derivation and their history
//!
//! A genome = four trait sub-records (visual, behavioral, physical,
//! evolutionary) + an append-only, hash-chained mutation history.

mod fields;
mod trait_set;
mod generator;
mod history;

pub use fields::{Color, FieldSpec, Shape, TraitCategory, TraitField};
pub use trait_set::{BehavioralTraits, EvolutionaryTraits, PhysicalTraits, TraitSet, VisualTraits};
pub use generator::{GeneratorConfig, TraitGenerator, PRIMARY_CHANNEL, SECONDARY_CHANNEL};
pub use history::{MutatedField, MutationHistory, MutationRecord, TraitValue};

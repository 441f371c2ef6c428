//! Evolution: milestone-gated mutation of living organisms
//!
//! Confirmation counts feed the engine; crossings of the fixed milestones
//! trigger a single reproducible roll each.

mod engine;
mod event;
mod milestone;
mod rarity;

pub use engine::{EngineState, EngineStats, EvolutionConfig, EvolutionEngine};
pub use event::{MutationEvent, MutationKind, MutationPolicy, SplitRequest};
pub use milestone::Milestone;
pub use rarity::RarityTier;

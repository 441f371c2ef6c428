//! Chainborn: block-seeded organism genesis
//!
//! Deterministic trait generation from a 32-bit seed, weighted role
//! allocation, a pooled particle arena with integrity repair, and
//! milestone-gated evolution driven by confirmation counts.

pub mod allocation;
pub mod config;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod pool;
pub mod population;
pub mod rng;

pub use allocation::{AllocationPlanner, Role};
pub use config::ChainbornConfig;
pub use error::{ChainbornError, Result};
pub use evolution::{EvolutionEngine, Milestone, MutationEvent, RarityTier};
pub use genome::{TraitGenerator, TraitSet};
pub use pool::{ParticlePool, SlotHandle};
pub use population::{Organism, OrganismId, Population};
pub use rng::{RngState, Seed};

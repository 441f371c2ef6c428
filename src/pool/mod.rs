//! Particle pool: bounded, reusable supply of particle slots
//!
//! - **ParticlePool**: arena + free list, O(1) acquire/release
//! - **SlotHandle**: index + generation capability token
//! - **RepairReport**: output of the integrity check and rebuild
//! - **Particle**: the payload the population stores in each slot

mod handle;
mod arena;
mod report;
mod particle;

pub use handle::SlotHandle;
pub use arena::{ParticlePool, PoolStats, Recyclable};
pub use report::{PoolCounts, PoolIssue, RepairReport};
pub use particle::{Particle, ParticleInit, RenderBinding};

//! Particle: the payload stored in each pool slot
//!
//! Renderer state is an explicit, typed optional field rather than an
//! untyped bag, so a recycled slot is reset field by field and nothing from
//! the previous occupant survives into the next one.

use super::Recyclable;
use crate::population::Organism;
use serde::{Deserialize, Serialize};

/// Handle into a resource owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderBinding {
    Sprite(u32),
    Mesh(u32),
    Instanced { buffer: u32, offset: u32 },
}

/// Live state of one pooled particle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particle {
    pub organism: Option<Organism>,
    pub binding: Option<RenderBinding>,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
}

/// Data a particle is activated with
#[derive(Debug, Clone)]
pub struct ParticleInit {
    pub organism: Organism,
    pub position: [f32; 3],
}

impl Recyclable for Particle {
    type Init = ParticleInit;

    fn activate(&mut self, init: ParticleInit) {
        self.organism = Some(init.organism);
        self.position = init.position;
        self.velocity = [0.0; 3];
        self.binding = None;
    }

    fn recycle(&mut self) {
        self.organism = None;
        self.binding = None;
        self.position = [0.0; 3];
        self.velocity = [0.0; 3];
    }
}

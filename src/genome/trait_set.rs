//! TraitSet: the full genome of one organism
//!
//! Four sub-records plus the owned mutation history. Numeric fields are
//! reachable through `get`/`set` keyed by `TraitField`; `set` clamps, so no
//! write path can leave a value outside its declared range.

use super::{Color, MutationHistory, Shape, TraitField};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTraits {
    pub primary_color: Color,
    pub secondary_color: Color,
    pub size: f64,
    pub opacity: f64,
    pub shape: Shape,
    pub density: f64,
    pub glow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralTraits {
    pub speed: f64,
    pub aggression: f64,
    pub sociability: f64,
    pub curiosity: f64,
    pub efficiency: f64,
    pub adaptability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTraits {
    pub mass: f64,
    pub collision_radius: f64,
    pub energy_capacity: f64,
    pub durability: f64,
    pub regeneration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionaryTraits {
    /// Incremented on every mutation pass; not drawn
    pub generation: u32,
    pub fitness: f64,
    pub stability: f64,
    pub reproductivity: f64,
    pub longevity: f64,
}

/// Complete trait set of an organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitSet {
    pub visual: VisualTraits,
    pub behavioral: BehavioralTraits,
    pub physical: PhysicalTraits,
    pub evolutionary: EvolutionaryTraits,
    pub history: MutationHistory,
}

impl Default for TraitSet {
    /// Every numeric field at its range midpoint, neutral colours, sphere
    fn default() -> Self {
        let mid = |field: TraitField| field.spec().midpoint();
        Self {
            visual: VisualTraits {
                primary_color: Color::NEUTRAL,
                secondary_color: Color::NEUTRAL,
                size: mid(TraitField::Size),
                opacity: mid(TraitField::Opacity),
                shape: Shape::default(),
                density: mid(TraitField::Density),
                glow: mid(TraitField::Glow),
            },
            behavioral: BehavioralTraits {
                speed: mid(TraitField::Speed),
                aggression: mid(TraitField::Aggression),
                sociability: mid(TraitField::Sociability),
                curiosity: mid(TraitField::Curiosity),
                efficiency: mid(TraitField::Efficiency),
                adaptability: mid(TraitField::Adaptability),
            },
            physical: PhysicalTraits {
                mass: mid(TraitField::Mass),
                collision_radius: mid(TraitField::CollisionRadius),
                energy_capacity: mid(TraitField::EnergyCapacity),
                durability: mid(TraitField::Durability),
                regeneration: mid(TraitField::Regeneration),
            },
            evolutionary: EvolutionaryTraits {
                generation: 0,
                fitness: mid(TraitField::Fitness),
                stability: mid(TraitField::Stability),
                reproductivity: mid(TraitField::Reproductivity),
                longevity: mid(TraitField::Longevity),
            },
            history: MutationHistory::new(),
        }
    }
}

impl TraitSet {
    pub fn get(&self, field: TraitField) -> f64 {
        *self.slot(field)
    }

    /// Write a field, clamped to its declared range. Returns the stored value.
    pub fn set(&mut self, field: TraitField, value: f64) -> f64 {
        let clamped = field.spec().clamp(value);
        *self.slot_mut(field) = clamped;
        clamped
    }

    /// True when every numeric field lies inside its declared range
    pub fn within_bounds(&self) -> bool {
        TraitField::ALL
            .iter()
            .all(|f| f.spec().contains(self.get(*f)))
    }

    /// Re-clamp every field (used after deserializing foreign snapshots)
    pub fn clamp_all(&mut self) {
        for field in TraitField::ALL {
            let v = self.get(field);
            self.set(field, v);
        }
    }

    /// Trait values without history, for determinism comparisons
    pub fn same_genome(&self, other: &TraitSet) -> bool {
        self.visual == other.visual
            && self.behavioral == other.behavioral
            && self.physical == other.physical
            && self.evolutionary == other.evolutionary
    }

    pub fn summary(&self) -> String {
        format!(
            "{:?} {}/{} | size={:.2} speed={:.2} mass={:.2} | gen={} fitness={:.3} | {} mutations",
            self.visual.shape,
            self.visual.primary_color,
            self.visual.secondary_color,
            self.visual.size,
            self.behavioral.speed,
            self.physical.mass,
            self.evolutionary.generation,
            self.evolutionary.fitness,
            self.history.len(),
        )
    }

    fn slot(&self, field: TraitField) -> &f64 {
        use TraitField::*;
        match field {
            Size => &self.visual.size,
            Opacity => &self.visual.opacity,
            Density => &self.visual.density,
            Glow => &self.visual.glow,
            Speed => &self.behavioral.speed,
            Aggression => &self.behavioral.aggression,
            Sociability => &self.behavioral.sociability,
            Curiosity => &self.behavioral.curiosity,
            Efficiency => &self.behavioral.efficiency,
            Adaptability => &self.behavioral.adaptability,
            Mass => &self.physical.mass,
            CollisionRadius => &self.physical.collision_radius,
            EnergyCapacity => &self.physical.energy_capacity,
            Durability => &self.physical.durability,
            Regeneration => &self.physical.regeneration,
            Fitness => &self.evolutionary.fitness,
            Stability => &self.evolutionary.stability,
            Reproductivity => &self.evolutionary.reproductivity,
            Longevity => &self.evolutionary.longevity,
        }
    }

    fn slot_mut(&mut self, field: TraitField) -> &mut f64 {
        use TraitField::*;
        match field {
            Size => &mut self.visual.size,
            Opacity => &mut self.visual.opacity,
            Density => &mut self.visual.density,
            Glow => &mut self.visual.glow,
            Speed => &mut self.behavioral.speed,
            Aggression => &mut self.behavioral.aggression,
            Sociability => &mut self.behavioral.sociability,
            Curiosity => &mut self.behavioral.curiosity,
            Efficiency => &mut self.behavioral.efficiency,
            Adaptability => &mut self.behavioral.adaptability,
            Mass => &mut self.physical.mass,
            CollisionRadius => &mut self.physical.collision_radius,
            EnergyCapacity => &mut self.physical.energy_capacity,
            Durability => &mut self.physical.durability,
            Regeneration => &mut self.physical.regeneration,
            Fitness => &mut self.evolutionary.fitness,
            Stability => &mut self.evolutionary.stability,
            Reproductivity => &mut self.evolutionary.reproductivity,
            Longevity => &mut self.evolutionary.longevity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_within_bounds() {
        let traits = TraitSet::default();
        assert!(traits.within_bounds());
        assert_eq!(traits.evolutionary.generation, 0);
        assert!(traits.history.is_empty());
    }

    #[test]
    fn test_set_clamps() {
        let mut traits = TraitSet::default();
        assert_eq!(traits.set(TraitField::Speed, 99.0), 5.0);
        assert_eq!(traits.behavioral.speed, 5.0);
        assert_eq!(traits.set(TraitField::Regeneration, -1.0), 0.0);
        assert!(traits.within_bounds());
    }

    #[test]
    fn test_clamp_all_repairs_foreign_values() {
        let mut traits = TraitSet::default();
        traits.physical.mass = 1_000.0;
        traits.visual.opacity = -3.0;
        assert!(!traits.within_bounds());
        traits.clamp_all();
        assert!(traits.within_bounds());
        assert_eq!(traits.physical.mass, 10.0);
    }

    #[test]
    fn test_get_set_every_field() {
        let mut traits = TraitSet::default();
        for field in TraitField::ALL {
            let spec = field.spec();
            traits.set(field, spec.min);
            assert_eq!(traits.get(field), spec.min, "{field}");
        }
    }
}

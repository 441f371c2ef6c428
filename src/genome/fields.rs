//! Field declarations: every numeric trait, its category and its range
//!
//! The declaration table is the single authority on ranges. Generation maps
//! draws into it, mutation clamps against it and `TraitSet::within_bounds`
//! checks it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four trait sub-records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitCategory {
    Visual,
    Behavioral,
    Physical,
    Evolutionary,
}

impl TraitCategory {
    pub const ALL: [TraitCategory; 4] = [
        TraitCategory::Visual,
        TraitCategory::Behavioral,
        TraitCategory::Physical,
        TraitCategory::Evolutionary,
    ];

    /// Purpose name used to derive this category's sub-stream
    pub fn name(self) -> &'static str {
        match self {
            TraitCategory::Visual => "visual",
            TraitCategory::Behavioral => "behavioral",
            TraitCategory::Physical => "physical",
            TraitCategory::Evolutionary => "evolutionary",
        }
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared bounds and mutation variance of a numeric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub min: f64,
    pub max: f64,
    /// Maximum magnitude of a single random perturbation
    pub variance: f64,
}

impl FieldSpec {
    const fn new(min: f64, max: f64, variance: f64) -> Self {
        Self { min, max, variance }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.midpoint();
        }
        value.clamp(self.min, self.max)
    }

    /// Linear map of a unit value into `[min, max]`
    pub fn lerp(&self, unit: f64) -> f64 {
        self.clamp(self.min + unit * (self.max - self.min))
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Every numeric (f64) trait field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitField {
    // Visual
    Size,
    Opacity,
    Density,
    Glow,
    // Behavioral
    Speed,
    Aggression,
    Sociability,
    Curiosity,
    Efficiency,
    Adaptability,
    // Physical
    Mass,
    CollisionRadius,
    EnergyCapacity,
    Durability,
    Regeneration,
    // Evolutionary
    Fitness,
    Stability,
    Reproductivity,
    Longevity,
}

impl TraitField {
    /// Declaration order; mutation walks fields in this order
    pub const ALL: [TraitField; 19] = [
        TraitField::Size,
        TraitField::Opacity,
        TraitField::Density,
        TraitField::Glow,
        TraitField::Speed,
        TraitField::Aggression,
        TraitField::Sociability,
        TraitField::Curiosity,
        TraitField::Efficiency,
        TraitField::Adaptability,
        TraitField::Mass,
        TraitField::CollisionRadius,
        TraitField::EnergyCapacity,
        TraitField::Durability,
        TraitField::Regeneration,
        TraitField::Fitness,
        TraitField::Stability,
        TraitField::Reproductivity,
        TraitField::Longevity,
    ];

    pub fn spec(self) -> FieldSpec {
        use TraitField::*;
        match self {
            Size => FieldSpec::new(0.5, 3.0, 0.3),
            Opacity => FieldSpec::new(0.3, 1.0, 0.1),
            Density => FieldSpec::new(0.1, 1.0, 0.1),
            Glow => FieldSpec::new(0.0, 1.0, 0.15),
            Speed => FieldSpec::new(0.1, 5.0, 0.5),
            Aggression => FieldSpec::new(0.0, 1.0, 0.15),
            Sociability => FieldSpec::new(0.0, 1.0, 0.15),
            Curiosity => FieldSpec::new(0.0, 1.0, 0.15),
            Efficiency => FieldSpec::new(0.2, 1.0, 0.1),
            Adaptability => FieldSpec::new(0.0, 1.0, 0.15),
            Mass => FieldSpec::new(0.5, 10.0, 1.0),
            CollisionRadius => FieldSpec::new(0.1, 2.0, 0.2),
            EnergyCapacity => FieldSpec::new(50.0, 500.0, 40.0),
            Durability => FieldSpec::new(0.1, 1.0, 0.1),
            Regeneration => FieldSpec::new(0.0, 0.5, 0.05),
            Fitness => FieldSpec::new(0.0, 1.0, 0.1),
            Stability => FieldSpec::new(0.0, 1.0, 0.1),
            Reproductivity => FieldSpec::new(0.0, 1.0, 0.1),
            Longevity => FieldSpec::new(100.0, 10_000.0, 500.0),
        }
    }

    pub fn category(self) -> TraitCategory {
        use TraitField::*;
        match self {
            Size | Opacity | Density | Glow => TraitCategory::Visual,
            Speed | Aggression | Sociability | Curiosity | Efficiency | Adaptability => {
                TraitCategory::Behavioral
            }
            Mass | CollisionRadius | EnergyCapacity | Durability | Regeneration => {
                TraitCategory::Physical
            }
            Fitness | Stability | Reproductivity | Longevity => TraitCategory::Evolutionary,
        }
    }

    pub fn name(self) -> &'static str {
        use TraitField::*;
        match self {
            Size => "size",
            Opacity => "opacity",
            Density => "density",
            Glow => "glow",
            Speed => "speed",
            Aggression => "aggression",
            Sociability => "sociability",
            Curiosity => "curiosity",
            Efficiency => "efficiency",
            Adaptability => "adaptability",
            Mass => "mass",
            CollisionRadius => "collision_radius",
            EnergyCapacity => "energy_capacity",
            Durability => "durability",
            Regeneration => "regeneration",
            Fitness => "fitness",
            Stability => "stability",
            Reproductivity => "reproductivity",
            Longevity => "longevity",
        }
    }
}

impl fmt::Display for TraitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Particle silhouette used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Sphere,
    Cube,
    Tetrahedron,
    Octahedron,
    Torus,
    Helix,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Sphere,
        Shape::Cube,
        Shape::Tetrahedron,
        Shape::Octahedron,
        Shape::Torus,
        Shape::Helix,
    ];

    /// Pick by `draw % 6`
    pub fn from_draw(draw: u32) -> Self {
        Self::ALL[(draw % Self::ALL.len() as u32) as usize]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const NEUTRAL: Color = Color { r: 128, g: 128, b: 128 };

    /// Map one draw into the inclusive channel range `[lo, hi]`
    pub fn channel(draw: u32, lo: u8, hi: u8) -> u8 {
        let width = u32::from(hi.saturating_sub(lo)) + 1;
        lo + (draw % width) as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_ranges_are_sane() {
        for field in TraitField::ALL {
            let spec = field.spec();
            assert!(spec.min < spec.max, "{field} has an empty range");
            assert!(spec.variance > 0.0 && spec.variance < spec.span(), "{field}");
        }
    }

    #[test]
    fn test_categories_cover_all_fields() {
        let visual = TraitField::ALL
            .iter()
            .filter(|f| f.category() == TraitCategory::Visual)
            .count();
        let behavioral = TraitField::ALL
            .iter()
            .filter(|f| f.category() == TraitCategory::Behavioral)
            .count();
        assert_eq!(visual, 4);
        assert_eq!(behavioral, 6);
    }

    #[test]
    fn test_clamp_and_lerp() {
        let spec = TraitField::Mass.spec();
        assert_eq!(spec.clamp(100.0), 10.0);
        assert_eq!(spec.clamp(-5.0), 0.5);
        assert_eq!(spec.clamp(f64::NAN), spec.midpoint());
        assert_eq!(spec.lerp(0.0), 0.5);
        assert!(spec.lerp(0.999_999) <= spec.max);
    }

    #[test]
    fn test_color_channel_and_format() {
        assert_eq!(Color::channel(0, 64, 255), 64);
        assert_eq!(Color::channel(191, 64, 255), 255);
        assert_eq!(Color::channel(192, 64, 255), 64);
        let c = Color { r: 255, g: 0, b: 16 };
        assert_eq!(c.to_string(), "#ff0010");
    }

    #[test]
    fn test_shape_from_draw() {
        assert_eq!(Shape::from_draw(0), Shape::Sphere);
        assert_eq!(Shape::from_draw(7), Shape::Cube);
        assert_eq!(Shape::Helix.index(), 5);
    }
}

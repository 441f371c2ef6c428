//! Population: organisms and the owner that keeps them in the pool

mod organism;
mod colony;

pub use organism::{Organism, OrganismId};
pub use colony::{Population, PopulationReport};

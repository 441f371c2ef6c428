//! ChainbornConfig: every tunable of a population in one serde record

use crate::allocation::{PlannerConfig, Role};
use crate::error::{ChainbornError, Result};
use crate::evolution::{EvolutionConfig, MutationPolicy};
use crate::genome::GeneratorConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainbornConfig {
    /// Slots pre-allocated in the particle pool
    pub pool_capacity: usize,
    /// Organisms spawned at genesis
    pub initial_population: u32,
    /// Guaranteed organisms per role before the weighted remainder
    pub base_count_per_role: u32,
    pub planner: PlannerConfig,
    pub generator: GeneratorConfig,
    pub evolution: EvolutionConfig,
}

impl Default for ChainbornConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 640,
            initial_population: 500,
            base_count_per_role: 40,
            planner: PlannerConfig::default(),
            generator: GeneratorConfig::default(),
            evolution: EvolutionConfig::default(),
        }
    }
}

impl ChainbornConfig {
    /// Small pool for tests and demos
    pub fn compact() -> Self {
        Self {
            pool_capacity: 64,
            initial_population: 40,
            base_count_per_role: 2,
            ..Self::default()
        }
    }

    /// Large, fast-drifting population
    pub fn dense() -> Self {
        Self {
            pool_capacity: 4096,
            initial_population: 3200,
            base_count_per_role: 200,
            planner: PlannerConfig {
                weight_floor: 0.05,
                weight_ceiling: 0.40,
            },
            generator: GeneratorConfig {
                mutation_rate: 0.10,
                inheritance_weight: 0.5,
            },
            evolution: EvolutionConfig {
                policy: MutationPolicy::Weighted([4, 2, 3, 1]),
                max_members: 128,
            },
        }
    }

    /// Reject anything a population could not be built from
    pub fn validate(&self) -> Result<()> {
        if self.pool_capacity == 0 {
            return Err(ChainbornError::Configuration(
                "pool_capacity must be positive".into(),
            ));
        }
        if self.pool_capacity < self.initial_population as usize {
            return Err(ChainbornError::Configuration(format!(
                "pool_capacity {} cannot hold initial_population {}",
                self.pool_capacity, self.initial_population
            )));
        }
        let floor = u64::from(self.base_count_per_role) * Role::ALL.len() as u64;
        if floor > u64::from(self.initial_population) {
            return Err(ChainbornError::Configuration(format!(
                "base allocation {} exceeds initial_population {}",
                floor, self.initial_population
            )));
        }
        self.planner.validate()?;
        self.generator.validate()?;
        self.evolution.validate()?;
        Ok(())
    }

    /// Save config to a pretty JSON file
    pub fn save(&self, path: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &str) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ChainbornConfig::default().validate().is_ok());
        assert!(ChainbornConfig::compact().validate().is_ok());
        assert!(ChainbornConfig::dense().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let mut config = ChainbornConfig::default();
        config.pool_capacity = 0;
        assert!(config.validate().unwrap_err().is_fatal());

        let mut config = ChainbornConfig::default();
        config.pool_capacity = 100;
        assert!(config.validate().is_err());

        let mut config = ChainbornConfig::default();
        config.base_count_per_role = 63;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nested_errors() {
        let mut config = ChainbornConfig::default();
        config.planner.weight_floor = 0.5;
        assert!(config.validate().is_err());

        let mut config = ChainbornConfig::default();
        config.generator.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = ChainbornConfig::default();
        config.evolution.policy = MutationPolicy::Weighted([u32::MAX, 1, 0, 0]);
        assert!(config.validate().unwrap_err().is_fatal());
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("chainborn-config-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let config = ChainbornConfig::dense();
        config.save(&path).unwrap();
        let loaded = ChainbornConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_file(&path).unwrap();
    }
}

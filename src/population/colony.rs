//! Population: owner that wires the pool, generator, planner and engine
//!
//! Organisms live inside pooled particles. An id index maps each organism to
//! the slot handle holding it; the handle's generation keeps a destroyed id
//! from resolving to whatever reuses the slot.

use super::{Organism, OrganismId};
use crate::allocation::{AllocationPlanner, Role};
use crate::config::ChainbornConfig;
use crate::error::{ChainbornError, Result};
use crate::evolution::{EvolutionEngine, MutationEvent, SplitRequest};
use crate::genome::{TraitCategory, TraitGenerator};
use crate::pool::{Particle, ParticleInit, ParticlePool, RepairReport, SlotHandle};
use crate::rng::{RngState, Seed};
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};

/// Result of `Population::validate`
#[derive(Debug, Clone)]
pub struct PopulationReport {
    pub pool: RepairReport,
    /// Index entries whose slot no longer holds their organism
    pub stale_ids: usize,
    /// Live organisms missing from the index and added back
    pub reindexed: usize,
}

impl PopulationReport {
    pub fn is_clean(&self) -> bool {
        self.pool.is_clean() && self.stale_ids == 0 && self.reindexed == 0
    }
}

pub struct Population {
    config: ChainbornConfig,
    pool: ParticlePool<Particle>,
    index: HashMap<OrganismId, SlotHandle>,
    generator: TraitGenerator,
    planner: AllocationPlanner,
    engine: EvolutionEngine,
    sequence: u64,
}

impl Population {
    /// Empty population with a validated config
    pub fn new(config: ChainbornConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool: ParticlePool::new(config.pool_capacity)?,
            index: HashMap::new(),
            generator: TraitGenerator::new(config.generator.clone()),
            planner: AllocationPlanner::new(config.planner.clone()),
            engine: EvolutionEngine::new(config.evolution.clone()),
            sequence: 0,
            config,
        })
    }

    /// Plan roles from `seed` and spawn the initial organisms
    pub fn genesis(config: ChainbornConfig, seed: Seed) -> Result<Self> {
        let mut population = Self::new(config)?;
        let root = RngState::seed(seed);

        let mut allocation = root.derive("allocation");
        let plan = population.planner.plan_roles(
            population.config.initial_population,
            population.config.base_count_per_role,
            &mut allocation,
        )?;

        let mut n: u64 = 0;
        for (role, count) in &plan {
            for _ in 0..*count {
                let organism_seed = Seed::new(root.derive(&format!("organism:{}", n)).raw());
                let traits = population
                    .generator
                    .generate_genesis(organism_seed, &TraitCategory::ALL);
                let organism = Organism::new(organism_seed, *role, traits, population.next_sequence());
                population.spawn(organism)?;
                n += 1;
            }
        }

        info!(
            "Genesis from seed {}: {} organisms across {} roles ({}/{} slots)",
            seed,
            population.len(),
            plan.len(),
            population.pool.active_count(),
            population.pool.capacity()
        );
        Ok(population)
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    /// Place an organism into a free slot
    pub fn spawn(&mut self, organism: Organism) -> Result<OrganismId> {
        let id = organism.id.clone();
        if self.index.contains_key(&id) {
            return Err(ChainbornError::DuplicateOrganism(id));
        }
        let position = Self::spawn_position(organism.seed);
        let handle = self.pool.acquire(ParticleInit { organism, position })?;
        self.index.insert(id.clone(), handle);
        Ok(id)
    }

    fn spawn_position(seed: Seed) -> [f32; 3] {
        let mut rng = RngState::seed(seed).derive("position");
        [
            rng.range_f64(-1.0, 1.0) as f32,
            rng.range_f64(-1.0, 1.0) as f32,
            rng.range_f64(-1.0, 1.0) as f32,
        ]
    }

    /// Release the organism's slot; its id resolves to nothing afterwards
    pub fn destroy(&mut self, id: &OrganismId) -> Result<Organism> {
        let handle = self
            .index
            .remove(id)
            .ok_or_else(|| ChainbornError::UnknownOrganism(id.clone()))?;
        let organism = self
            .pool
            .get_mut(handle)
            .and_then(|p| p.organism.take())
            .ok_or(ChainbornError::InvalidHandle(handle))?;
        self.pool.release(handle)?;
        Ok(organism)
    }

    pub fn get(&self, id: &OrganismId) -> Option<&Organism> {
        let handle = self.index.get(id)?;
        self.pool.get(*handle)?.organism.as_ref()
    }

    pub fn get_mut(&mut self, id: &OrganismId) -> Option<&mut Organism> {
        let handle = self.index.get(id)?;
        self.pool.get_mut(*handle)?.organism.as_mut()
    }

    pub fn particle(&self, id: &OrganismId) -> Option<&Particle> {
        let handle = self.index.get(id)?;
        self.pool.get(*handle)
    }

    /// Live organisms in slot order
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.pool
            .iter_active()
            .filter_map(|(_, particle)| particle.organism.as_ref())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn config(&self) -> &ChainbornConfig {
        &self.config
    }

    pub fn pool(&self) -> &ParticlePool<Particle> {
        &self.pool
    }

    pub fn engine(&self) -> &EvolutionEngine {
        &self.engine
    }

    pub fn generator(&self) -> &TraitGenerator {
        &self.generator
    }

    /// Feed a confirmation count to the engine and fulfil any group splits
    pub fn advance(&mut self, confirmations: u64, nonce: Seed) -> Vec<MutationEvent> {
        let events = {
            let mut organisms: Vec<&mut Organism> = self
                .pool
                .iter_active_mut()
                .filter_map(|(_, particle)| particle.organism.as_mut())
                .collect();
            self.engine.advance(confirmations, nonce, &mut organisms)
        };

        for split in events.iter().filter_map(|e| e.split.as_ref()) {
            if let Err(e) = self.fulfil_split(split) {
                warn!("Split of {} skipped: {}", split.parent, e);
            }
        }
        events
    }

    /// Take the engine's buffered event log
    pub fn drain_events(&mut self) -> Vec<MutationEvent> {
        self.engine.drain_events()
    }

    fn fulfil_split(&mut self, split: &SplitRequest) -> Result<OrganismId> {
        if self.pool.is_full() {
            return Err(ChainbornError::PoolExhausted {
                capacity: self.pool.capacity(),
            });
        }
        let parent = self
            .get(&split.parent)
            .ok_or_else(|| ChainbornError::UnknownOrganism(split.parent.clone()))?;
        let traits = self.generator.generate_inherited(split.seed, &[&parent.traits]);
        let role = parent.role;
        let parent_id = parent.id.clone();

        let sequence = self.next_sequence();
        let child = Organism::new(split.seed, role, traits, sequence)
            .with_members(split.members)
            .with_parents(vec![parent_id]);
        self.spawn(child)
    }

    /// One ambient drift pass over every live organism; returns the record count
    pub fn mutate_all(&mut self, rng: &mut RngState) -> usize {
        let rate = self.config.generator.mutation_rate;
        let generator = &self.generator;
        self.pool
            .iter_active_mut()
            .filter_map(|(_, particle)| particle.organism.as_mut())
            .map(|organism| {
                generator
                    .mutate_in_place(&mut organism.traits, rate, rng, None)
                    .len()
            })
            .sum()
    }

    /// Repair the pool, then reconcile the id index with the live slots
    pub fn validate(&mut self) -> PopulationReport {
        let pool = self.pool.validate();

        let pool_ref = &self.pool;
        let before = self.index.len();
        self.index.retain(|id, handle| {
            pool_ref
                .get(*handle)
                .and_then(|p| p.organism.as_ref())
                .is_some_and(|o| &o.id == id)
        });
        let stale_ids = before - self.index.len();

        let mut reindexed = 0;
        for (handle, particle) in self.pool.iter_active() {
            if let Some(organism) = particle.organism.as_ref() {
                if !self.index.contains_key(&organism.id) {
                    self.index.insert(organism.id.clone(), handle);
                    reindexed += 1;
                }
            }
        }

        if stale_ids > 0 || reindexed > 0 {
            warn!(
                "Population index reconciled: {} stale, {} reindexed",
                stale_ids, reindexed
            );
        }
        PopulationReport {
            pool,
            stale_ids,
            reindexed,
        }
    }

    /// Live organisms per role (every role present, possibly zero)
    pub fn role_counts(&self) -> BTreeMap<Role, u32> {
        let mut counts: BTreeMap<Role, u32> = Role::ALL.iter().map(|r| (*r, 0)).collect();
        for organism in self.organisms() {
            *counts.entry(organism.role).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{EvolutionConfig, Milestone, MutationKind, MutationPolicy};

    fn compact(seed: u32) -> Population {
        Population::genesis(ChainbornConfig::compact(), Seed::new(seed)).unwrap()
    }

    /// Give every organism a group large enough to split repeatedly
    fn widen(population: &mut Population, members: u32) {
        let ids: Vec<OrganismId> = population.organisms().map(|o| o.id.clone()).collect();
        for id in ids {
            if let Some(organism) = population.get_mut(&id) {
                organism.members = members;
            }
        }
    }

    #[test]
    fn test_genesis_matches_plan() {
        let population = compact(123_456_789);
        let config = ChainbornConfig::compact();
        assert_eq!(population.len(), config.initial_population as usize);
        assert_eq!(population.pool().active_count(), config.initial_population as usize);

        let counts = population.role_counts();
        assert_eq!(counts.len(), 8);
        assert_eq!(counts.values().sum::<u32>(), config.initial_population);
        assert!(counts.values().all(|c| *c >= config.base_count_per_role));
        assert!(population.organisms().all(|o| o.traits.within_bounds()));
    }

    #[test]
    fn test_genesis_is_deterministic() {
        let a = compact(99);
        let b = compact(99);
        let genomes = |p: &Population| {
            p.organisms()
                .map(|o| (o.seed, o.role, o.traits.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(genomes(&a), genomes(&b));
        assert_eq!(a.role_counts(), b.role_counts());
        assert_ne!(genomes(&a), genomes(&compact(100)));
    }

    #[test]
    fn test_genesis_rejects_invalid_config() {
        let mut config = ChainbornConfig::compact();
        config.pool_capacity = 10;
        assert!(matches!(
            Population::genesis(config, Seed::new(1)),
            Err(ChainbornError::Configuration(_))
        ));
    }

    #[test]
    fn test_destroy_invalidates_id() {
        let mut population = compact(5);
        let id = population.organisms().next().unwrap().id.clone();
        let free_before = population.pool().free_count();

        let organism = population.destroy(&id).unwrap();
        assert_eq!(organism.id, id);
        assert!(population.get(&id).is_none());
        assert_eq!(population.pool().free_count(), free_before + 1);

        let again = population.destroy(&id).unwrap_err();
        assert_eq!(again, ChainbornError::UnknownOrganism(id.clone()));
        assert!(again.is_recoverable());
        assert_eq!(population.pool().free_count(), free_before + 1);

        // The freed slot is reused without resurrecting the old id
        let replacement = Organism::new(Seed::new(1), Role::Scout, Default::default(), 10_000);
        let new_id = population.spawn(replacement).unwrap();
        assert!(population.get(&id).is_none());
        assert!(population.get(&new_id).is_some());
    }

    #[test]
    fn test_spawn_same_organism_twice() {
        let mut population = compact(5);
        let organism = Organism::new(Seed::new(3), Role::Builder, Default::default(), 5_000);
        population.spawn(organism.clone()).unwrap();
        let active = population.pool().active_count();

        let err = population.spawn(organism.clone()).unwrap_err();
        assert_eq!(err, ChainbornError::DuplicateOrganism(organism.id));
        assert!(err.is_recoverable());
        assert_eq!(population.pool().active_count(), active);
    }

    #[test]
    fn test_spawn_until_exhausted() {
        let mut population = compact(5);
        let spare = population.pool().free_count();
        for i in 0..spare {
            let organism = Organism::new(Seed::new(i as u32), Role::Healer, Default::default(), 1_000 + i as u64);
            population.spawn(organism).unwrap();
        }
        let extra = Organism::new(Seed::new(7), Role::Healer, Default::default(), 9_999);
        let err = population.spawn(extra).unwrap_err();
        assert!(matches!(err, ChainbornError::PoolExhausted { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_mutate_all_keeps_bounds() {
        let mut population = compact(11);
        let mut rng = RngState::seed(3u32);
        let mut records = 0;
        for _ in 0..20 {
            records += population.mutate_all(&mut rng);
        }
        assert!(records > 0);
        for organism in population.organisms() {
            assert!(organism.traits.within_bounds());
            assert_eq!(organism.traits.evolutionary.generation, 20);
            assert!(organism.traits.history.verify_chain());
        }
    }

    #[test]
    fn test_advance_to_million_mutates() {
        let mut population = compact(21);
        population.advance(999_999, Seed::new(4));
        let events = population.advance(1_000_000, Seed::new(4));
        assert!(events.iter().any(|e| e.milestone == Milestone::OneMillion));
        assert!(population.organisms().all(|o| o.traits.within_bounds()));
        // Repeat is a no-op
        assert!(population.advance(1_000_000, Seed::new(4)).is_empty());
        assert_eq!(population.drain_events().len(), events.len());
        assert!(population.engine().events().is_empty());
    }

    #[test]
    fn test_group_split_spawns_child() {
        let mut config = ChainbornConfig::compact();
        config.evolution = EvolutionConfig {
            policy: MutationPolicy::Weighted([0, 0, 0, 1]),
            max_members: 64,
        };
        let mut population = Population::genesis(config, Seed::new(8)).unwrap();
        widen(&mut population, 64);
        let before = population.len();
        let events = population.advance(1_000_000, Seed::new(8));
        let splits: Vec<_> = events
            .iter()
            .filter(|e| e.kind == MutationKind::GroupSplit)
            .collect();
        assert!(!splits.is_empty());
        assert_eq!(population.len(), before + splits.len());

        for event in &splits {
            let split = event.split.as_ref().unwrap();
            assert!(split.members >= 1);
            let child = population
                .organisms()
                .find(|o| o.parent_ids.contains(&split.parent) && o.seed == split.seed)
                .unwrap();
            assert!(!child.is_genesis());
            assert_eq!(child.members, split.members);
        }
    }

    #[test]
    fn test_split_skipped_when_full() {
        let mut config = ChainbornConfig::compact();
        config.pool_capacity = config.initial_population as usize;
        config.evolution.policy = MutationPolicy::Weighted([0, 0, 0, 1]);
        let mut population = Population::genesis(config, Seed::new(8)).unwrap();
        widen(&mut population, 64);
        let events = population.advance(1_000_000, Seed::new(8));
        assert!(events.iter().any(|e| e.split.is_some()));
        assert_eq!(population.len(), population.pool().capacity());
    }

    #[test]
    fn test_validate_clean_population() {
        let mut population = compact(2);
        let id = population.organisms().nth(3).unwrap().id.clone();
        population.destroy(&id).unwrap();
        let report = population.validate();
        assert!(report.is_clean());
    }

    #[test]
    fn test_validate_reconciles_index() {
        let mut population = compact(2);
        let id = population.organisms().next().unwrap().id.clone();
        let handle = population.index.remove(&id).unwrap();
        population
            .index
            .insert(OrganismId::derive(Seed::new(0), chrono::Utc::now(), 77_777), handle);

        let report = population.validate();
        assert_eq!(report.stale_ids, 1);
        assert_eq!(report.reindexed, 1);
        assert!(population.get(&id).is_some());
        assert!(population.validate().is_clean());
    }
}

//! EvolutionEngine: milestone-gated mutation state machine
//!
//! Dormant until the confirmation count crosses a milestone boundary, then
//! Evaluating for that milestone, then Dormant again. Each crossing gets a
//! single probability roll; on success one organism (rarely two) is mutated.
//!
//! Rolls are reproducible: the stream for a crossing is derived from the
//! nonce and the boundary, never from wall-clock time.

use super::{Milestone, MutationEvent, MutationKind, MutationPolicy, RarityTier, SplitRequest};
use crate::error::{ChainbornError, Result};
use crate::genome::{MutatedField, MutationRecord, TraitField, TraitValue};
use crate::population::Organism;
use crate::rng::{RngState, Seed};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tuning for milestone mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub policy: MutationPolicy,
    /// Upper bound on an organism's group size
    pub max_members: u32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            policy: MutationPolicy::Uniform,
            max_members: 64,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_members < 2 {
            return Err(ChainbornError::Configuration(format!(
                "max_members {} leaves no room for growth",
                self.max_members
            )));
        }
        if let MutationPolicy::Weighted(weights) = &self.policy {
            match MutationPolicy::total_weight(weights) {
                Some(0) => {
                    return Err(ChainbornError::Configuration(
                        "weighted mutation policy needs at least one non-zero weight".into(),
                    ))
                }
                None => {
                    return Err(ChainbornError::Configuration(format!(
                        "mutation weights {:?} sum past {}",
                        weights,
                        u32::MAX
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Dormant,
    Evaluating(Milestone),
}

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Milestone crossings evaluated
    pub rolls: u64,
    /// Rolls that produced a mutation
    pub successes: u64,
    /// Events emitted (a success may emit two)
    pub events: u64,
}

/// Owns milestone bookkeeping and the event log
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    config: EvolutionConfig,
    state: EngineState,
    last_confirmations: Option<u64>,
    /// Highest boundary handled per milestone; boundaries only move forward
    processed: BTreeMap<Milestone, u64>,
    events: Vec<MutationEvent>,
    stats: EngineStats,
}

impl Default for EvolutionEngine {
    fn default() -> Self {
        Self::new(EvolutionConfig::default())
    }
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            state: EngineState::Dormant,
            last_confirmations: None,
            processed: BTreeMap::new(),
            events: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn last_confirmations(&self) -> Option<u64> {
        self.last_confirmations
    }

    /// Events emitted since the last `drain_events`, oldest first
    pub fn events(&self) -> &[MutationEvent] {
        &self.events
    }

    /// Hand the buffered event log to the caller and start a fresh one
    pub fn drain_events(&mut self) -> Vec<MutationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// True once `boundary` is at or below the last boundary handled for `milestone`
    pub fn is_processed(&self, milestone: Milestone, boundary: u64) -> bool {
        self.processed
            .get(&milestone)
            .is_some_and(|last| *last >= boundary)
    }

    /// React to a new confirmation count.
    ///
    /// Repeating a count, or moving backwards, does nothing. Every milestone
    /// whose boundary was crossed since the previous count is evaluated once,
    /// lowest threshold first.
    pub fn advance(
        &mut self,
        confirmations: u64,
        nonce: Seed,
        organisms: &mut [&mut Organism],
    ) -> Vec<MutationEvent> {
        let previous = self.last_confirmations;
        match previous {
            Some(prev) if confirmations < prev => {
                warn!(
                    "Confirmation count went backwards ({} -> {}), ignoring",
                    prev, confirmations
                );
                return Vec::new();
            }
            Some(prev) if confirmations == prev => return Vec::new(),
            _ => {}
        }
        self.last_confirmations = Some(confirmations);

        let mut emitted = Vec::new();
        for milestone in Milestone::ALL {
            let Some(boundary) = milestone.crossed(previous, confirmations) else {
                continue;
            };
            if self.is_processed(milestone, boundary) {
                continue;
            }
            self.processed.insert(milestone, boundary);
            self.state = EngineState::Evaluating(milestone);
            emitted.extend(self.evaluate(milestone, boundary, nonce, organisms));
        }
        self.state = EngineState::Dormant;

        self.events.extend(emitted.iter().cloned());
        emitted
    }

    fn evaluate(
        &mut self,
        milestone: Milestone,
        boundary: u64,
        nonce: Seed,
        organisms: &mut [&mut Organism],
    ) -> Vec<MutationEvent> {
        let candidates: Vec<usize> = organisms
            .iter()
            .enumerate()
            .filter(|(_, o)| o.last_seed_for(milestone) != Some(nonce))
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            debug!("{} at {}: no unevaluated organisms", milestone, boundary);
            return Vec::new();
        }
        for &i in &candidates {
            organisms[i].mark_evaluated(milestone, nonce);
        }

        let purpose = format!("milestone:{}:{}", milestone.threshold(), boundary);
        let mut rng = RngState::seed(nonce).derive(&purpose);
        self.stats.rolls += 1;
        if !rng.chance(milestone.chance()) {
            debug!("{} at {}: roll failed", milestone, boundary);
            return Vec::new();
        }
        self.stats.successes += 1;

        let tier = milestone.roll_tier(&mut rng);
        let kind = self.config.policy.pick(&mut rng);

        let len = candidates.len() as u32;
        let first = rng.below(len) as usize;
        let mut targets = vec![candidates[first]];
        if len > 1 && rng.chance(tier.second_target_chance()) {
            let offset = 1 + rng.below(len - 1) as usize;
            targets.push(candidates[(first + offset) % candidates.len()]);
        }

        let now = Utc::now();
        let mut events = Vec::with_capacity(targets.len());
        for (n, &i) in targets.iter().enumerate() {
            let organism = &mut *organisms[i];
            let applied = self.resolve(kind, organism);
            let (records, split) = self.apply(applied, tier, milestone, organism, &mut rng, now);
            let event = MutationEvent {
                organism_id: organism.id.clone(),
                milestone,
                boundary,
                nonce,
                tier,
                kind: applied,
                secondary: n > 0,
                records,
                split,
                timestamp: now,
            };
            info!("Milestone mutation: {}", event.summary());
            events.push(event);
        }
        self.stats.events += events.len() as u64;
        events
    }

    /// Substitute a kind that would change nothing on this organism: a full
    /// genome cannot be boosted, a single member cannot split and a group at
    /// `max_members` cannot grow
    fn resolve(&self, kind: MutationKind, organism: &Organism) -> MutationKind {
        match kind {
            MutationKind::AttributeBoost if Self::boostable(organism).is_empty() => {
                MutationKind::RoleChange
            }
            MutationKind::GroupSplit if organism.members < 2 => {
                self.resolve(MutationKind::CountIncrease, organism)
            }
            MutationKind::CountIncrease if organism.members >= self.config.max_members => {
                MutationKind::RoleChange
            }
            other => other,
        }
    }

    /// Numeric fields still below their maximum
    fn boostable(organism: &Organism) -> Vec<TraitField> {
        TraitField::ALL
            .into_iter()
            .filter(|f| organism.traits.get(*f) < f.spec().max)
            .collect()
    }

    fn apply(
        &self,
        kind: MutationKind,
        tier: RarityTier,
        milestone: Milestone,
        organism: &mut Organism,
        rng: &mut RngState,
        now: DateTime<Utc>,
    ) -> (Vec<MutationRecord>, Option<SplitRequest>) {
        let record = |field, old, new| {
            MutationRecord::new(field, old, new, Some(milestone), tier, now)
        };
        let mut split = None;

        let change = match kind {
            MutationKind::AttributeBoost => {
                let fields = Self::boostable(organism);
                let field = fields[rng.below(fields.len() as u32) as usize];
                let old = organism.traits.get(field);
                let boosted = old + field.spec().span() * tier.boost_fraction();
                let new = organism.traits.set(field, boosted);
                record(
                    MutatedField::Trait(field),
                    TraitValue::Number(old),
                    TraitValue::Number(new),
                )
            }
            MutationKind::RoleChange => {
                let old = organism.role;
                let new = old.shifted(1 + rng.below(7) as usize);
                organism.role = new;
                record(MutatedField::Role, TraitValue::Role(old), TraitValue::Role(new))
            }
            MutationKind::CountIncrease => {
                let old = organism.members;
                let new = old
                    .saturating_add(tier.count_bonus())
                    .min(self.config.max_members);
                organism.members = new;
                record(MutatedField::Members, TraitValue::Count(old), TraitValue::Count(new))
            }
            MutationKind::GroupSplit => {
                let old = organism.members;
                // resolve() guarantees at least two members
                let child_members = old / 2;
                let kept = old - child_members;
                organism.members = kept;
                split = Some(SplitRequest {
                    parent: organism.id.clone(),
                    members: child_members,
                    seed: Seed::new(rng.draw()),
                });
                record(MutatedField::Members, TraitValue::Count(old), TraitValue::Count(kept))
            }
        };

        let evo = &mut organism.traits.evolutionary;
        evo.generation = evo.generation.saturating_add(1);

        let history = &mut organism.traits.history;
        history.append(change);
        let applied = history.last().cloned().into_iter().collect();
        (applied, split)
    }
}

//! AllocationPlanner: split a fixed entity count across categories
//!
//! Every category first receives the same deterministic floor. The
//! remainder is shared by RNG weights drawn from a narrow band, so no
//! category can swallow the whole remainder. Rounding error is absorbed by
//! the last category and the grand total always equals the requested total.

use super::Role;
use crate::error::{ChainbornError, Result};
use crate::rng::RngState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Band the raw per-category weights are drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub weight_floor: f64,
    pub weight_ceiling: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weight_floor: 0.10,
            weight_ceiling: 0.30,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        let valid = self.weight_floor > 0.0
            && self.weight_floor <= self.weight_ceiling
            && self.weight_ceiling <= 1.0;
        if valid {
            Ok(())
        } else {
            Err(ChainbornError::Configuration(format!(
                "planner weight band [{}, {}] must satisfy 0 < floor <= ceiling <= 1",
                self.weight_floor, self.weight_ceiling
            )))
        }
    }
}

/// Computes per-category counts
#[derive(Debug, Clone, Default)]
pub struct AllocationPlanner {
    config: PlannerConfig,
}

impl AllocationPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Distribute `total` across `categories`.
    ///
    /// Draws exactly `categories.len()` values from `rng`. Fails with an
    /// allocation error when the floor alone exceeds `total`.
    pub fn plan<C: Ord + Clone>(
        &self,
        total: u32,
        base_per_category: u32,
        categories: &[C],
        rng: &mut RngState,
    ) -> Result<BTreeMap<C, u32>> {
        self.config.validate()?;

        let mut plan: BTreeMap<C, u32> = BTreeMap::new();
        for category in categories {
            if plan.insert(category.clone(), base_per_category).is_some() {
                return Err(ChainbornError::Configuration(
                    "duplicate category in allocation request".into(),
                ));
            }
        }

        if categories.is_empty() {
            return if total == 0 {
                Ok(plan)
            } else {
                Err(ChainbornError::Allocation(format!(
                    "no categories to receive {} entities",
                    total
                )))
            };
        }

        let floor_total = u64::from(base_per_category) * categories.len() as u64;
        if floor_total > u64::from(total) {
            return Err(ChainbornError::Allocation(format!(
                "base allocation {} x {} = {} exceeds total {}",
                base_per_category,
                categories.len(),
                floor_total,
                total
            )));
        }
        // floor_total <= total, so the cast is lossless
        let remaining = total - floor_total as u32;

        let weights: Vec<f64> = categories
            .iter()
            .map(|_| rng.range_f64(self.config.weight_floor, self.config.weight_ceiling))
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        let mut left = remaining;
        let last = categories.len() - 1;
        for (i, category) in categories.iter().enumerate() {
            let share = if i == last {
                left
            } else {
                let ideal = f64::from(remaining) * weights[i] / weight_sum;
                (ideal.round() as u32).min(left)
            };
            left -= share;
            if let Some(count) = plan.get_mut(category) {
                *count += share;
            }
        }

        Ok(plan)
    }

    /// `plan` over the eight roles
    pub fn plan_roles(
        &self,
        total: u32,
        base_per_role: u32,
        rng: &mut RngState,
    ) -> Result<BTreeMap<Role, u32>> {
        self.plan(total, base_per_role, &Role::ALL, rng)
    }
}

//! ParticlePool: fixed-capacity arena with a free list
//!
//! The slot array is allocated once at construction and never resized.
//! `acquire` and `release` are O(1) and touch only the slot they name.
//!
//! Invariant: `free.len() + active == capacity`, with every free index in
//! range, unique and pointing at an inactive slot. Generation-stamped
//! handles keep stale or foreign handles from reaching a reused slot, so
//! the invariant cannot be broken through the public API; `validate` is
//! the fallback that detects and rebuilds it anyway.
//!
//! Single writer: every mutating method takes `&mut self`. Hosts that touch
//! the pool from several threads must serialize access themselves.

use super::report::{PoolCounts, PoolIssue, RepairReport};
use super::SlotHandle;
use crate::error::{ChainbornError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Payloads that can live in a `ParticlePool`
pub trait Recyclable: Default {
    /// Data needed to bring a slot to life
    type Init;

    /// Initialise a free slot in place
    fn activate(&mut self, init: Self::Init);

    /// Drop everything the previous occupant referenced
    fn recycle(&mut self);
}

#[derive(Debug, Clone, Default)]
struct Slot<T> {
    generation: u32,
    active: bool,
    payload: T,
}

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub acquisitions: u64,
    pub releases: u64,
    pub rejected_releases: u64,
    pub exhaustions: u64,
    pub peak_active: usize,
    pub repairs: u64,
}

/// Fixed-capacity pool of reusable slots
#[derive(Debug)]
pub struct ParticlePool<T: Recyclable> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    capacity: usize,
    active: usize,
    stats: PoolStats,
}

impl<T: Recyclable> ParticlePool<T> {
    /// Allocate every slot up front
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ChainbornError::Configuration(
                "pool capacity must be greater than zero".into(),
            ));
        }
        if capacity > u32::MAX as usize {
            return Err(ChainbornError::Configuration(format!(
                "pool capacity {} exceeds the 32-bit handle space",
                capacity
            )));
        }
        Ok(Self {
            slots: Self::fresh_slots(capacity),
            // reversed so the lowest index is handed out first
            free: (0..capacity as u32).rev().collect(),
            capacity,
            active: 0,
            stats: PoolStats::default(),
        })
    }

    /// Take a free slot and initialise it in place
    pub fn acquire(&mut self, init: T::Init) -> Result<SlotHandle> {
        while let Some(index) = self.free.pop() {
            let Some(slot) = self.slots.get_mut(index as usize) else {
                warn!("Dropping out-of-range free index {} on acquire", index);
                continue;
            };
            if slot.active {
                warn!("Dropping free-list entry {} for an active slot", index);
                continue;
            }
            slot.active = true;
            slot.payload.activate(init);
            let handle = SlotHandle::new(index, slot.generation);

            self.active += 1;
            self.stats.acquisitions += 1;
            self.stats.peak_active = self.stats.peak_active.max(self.active);
            return Ok(handle);
        }

        self.stats.exhaustions += 1;
        debug!("Pool exhausted at capacity {}", self.capacity);
        Err(ChainbornError::PoolExhausted {
            capacity: self.capacity,
        })
    }

    /// Recycle a slot and return its index to the free list.
    ///
    /// A released, stale or foreign handle yields `InvalidHandle` and leaves
    /// the pool untouched.
    pub fn release(&mut self, handle: SlotHandle) -> Result<()> {
        if !self.contains(handle) {
            self.stats.rejected_releases += 1;
            debug!("Rejected release of {}", handle);
            return Err(ChainbornError::InvalidHandle(handle));
        }
        let index = handle.index();
        debug_assert!(
            !self.free.contains(&(index as u32)),
            "active slot {} already in free list",
            index
        );

        let slot = &mut self.slots[index];
        slot.payload.recycle();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);

        self.free.push(index as u32);
        self.active -= 1;
        self.stats.releases += 1;
        Ok(())
    }

    /// Release every active slot
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            slot.payload.recycle();
            slot.active = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.stats.releases += 1;
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.active = 0;
    }

    /// True when `handle` names a currently active slot at its current generation
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.slots
            .get(handle.index())
            .map(|s| s.active && s.generation == handle.generation())
            .unwrap_or(false)
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.active && s.generation == handle.generation())
            .map(|s| &s.payload)
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.active && s.generation == handle.generation())
            .map(|s| &mut s.payload)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (SlotHandle::new(i as u32, s.generation), &s.payload))
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (SlotHandle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (SlotHandle::new(i as u32, s.generation), &mut s.payload))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Read-only diagnostic; never repairs
    pub fn check(&self) -> Result<()> {
        let issues = self.diagnose();
        if issues.is_empty() {
            return Ok(());
        }
        let described: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        Err(ChainbornError::PoolCorruption(described.join("; ")))
    }

    /// Diagnose and, if anything is wrong, rebuild the free list from the
    /// slot flags (reallocating the slot array if its length drifted)
    pub fn validate(&mut self) -> RepairReport {
        let before = self.counts();
        let issues = self.diagnose();
        if issues.is_empty() {
            return RepairReport::clean(before);
        }

        for issue in &issues {
            warn!("Pool corruption: {}", issue);
        }
        let reallocated = self.rebuild();
        self.stats.repairs += 1;

        let report = RepairReport {
            issues,
            repaired: true,
            reallocated,
            before,
            after: self.counts(),
        };
        info!("{}", report.summary());
        report
    }

    fn counts(&self) -> PoolCounts {
        PoolCounts {
            active: self.active,
            free: self.free.len(),
            slots: self.slots.len(),
        }
    }

    fn diagnose(&self) -> Vec<PoolIssue> {
        let mut issues = Vec::new();

        if self.slots.len() != self.capacity {
            issues.push(PoolIssue::SlotArrayDrift {
                len: self.slots.len(),
                capacity: self.capacity,
            });
        }

        let mut listed = vec![false; self.capacity];
        for &index in &self.free {
            let i = index as usize;
            if i >= self.capacity {
                issues.push(PoolIssue::OutOfRangeFreeIndex(index));
                continue;
            }
            if listed[i] {
                issues.push(PoolIssue::DuplicateFreeIndex(index));
                continue;
            }
            listed[i] = true;
            if self.slots.get(i).map(|s| s.active).unwrap_or(false) {
                issues.push(PoolIssue::ActiveIndexInFreeList(index));
            }
        }

        let mut actual_active = 0;
        for (i, slot) in self.slots.iter().enumerate().take(self.capacity) {
            if slot.active {
                actual_active += 1;
            } else if !listed[i] {
                issues.push(PoolIssue::LeakedSlot(i as u32));
            }
        }

        if actual_active != self.active {
            issues.push(PoolIssue::ActiveCountDrift {
                recorded: self.active,
                actual: actual_active,
            });
        }
        if self.free.len() + actual_active != self.capacity {
            issues.push(PoolIssue::CountMismatch {
                free: self.free.len(),
                active: actual_active,
                capacity: self.capacity,
            });
        }

        issues
    }

    /// Returns true if the slot array had to be reallocated
    fn rebuild(&mut self) -> bool {
        let reallocated = self.slots.len() != self.capacity;
        if reallocated {
            let old = std::mem::take(&mut self.slots);
            let mut fresh = Self::fresh_slots(self.capacity);
            for (i, slot) in old.into_iter().enumerate() {
                if i < self.capacity {
                    fresh[i] = slot;
                } else if slot.active {
                    warn!("Discarding active slot {} beyond capacity {}", i, self.capacity);
                }
            }
            self.slots = fresh;
        }

        for slot in self.slots.iter_mut().filter(|s| !s.active) {
            slot.payload.recycle();
        }
        self.free = self
            .slots
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, s)| !s.active)
            .map(|(i, _)| i as u32)
            .collect();
        self.active = self.slots.iter().filter(|s| s.active).count();
        reallocated
    }

    fn fresh_slots(capacity: usize) -> Vec<Slot<T>> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug, Default, PartialEq)]
    struct Probe {
        value: u32,
        texture: Option<u32>,
    }

    impl Recyclable for Probe {
        type Init = u32;

        fn activate(&mut self, init: u32) {
            self.value = init;
            self.texture = Some(init * 10);
        }

        fn recycle(&mut self) {
            self.value = 0;
            self.texture = None;
        }
    }

    fn conserved(pool: &ParticlePool<Probe>) -> bool {
        pool.free_count() + pool.active_count() == pool.capacity()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ParticlePool::<Probe>::new(0),
            Err(ChainbornError::Configuration(_))
        ));
    }

    #[test]
    fn test_fourth_acquire_exhausts() {
        let mut pool = ParticlePool::<Probe>::new(3).unwrap();
        for i in 0..3 {
            pool.acquire(i).unwrap();
        }
        let err = pool.acquire(99).unwrap_err();
        assert_eq!(err, ChainbornError::PoolExhausted { capacity: 3 });
        assert!(err.is_recoverable());
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.stats().exhaustions, 1);
        assert!(conserved(&pool));
    }

    #[test]
    fn test_acquire_initialises_in_place() {
        let mut pool = ParticlePool::<Probe>::new(4).unwrap();
        let h = pool.acquire(7).unwrap();
        assert_eq!(h.index(), 0);
        assert_eq!(pool.get(h), Some(&Probe { value: 7, texture: Some(70) }));
        pool.get_mut(h).unwrap().value = 8;
        assert_eq!(pool.get(h).unwrap().value, 8);
    }

    #[test]
    fn test_release_clears_payload_and_reuses_slot() {
        let mut pool = ParticlePool::<Probe>::new(2).unwrap();
        let h = pool.acquire(5).unwrap();
        pool.release(h).unwrap();
        assert_eq!(pool.get(h), None);
        let reused = pool.acquire(6).unwrap();
        assert_eq!(reused.index(), h.index());
        assert_ne!(reused.generation(), h.generation());
        assert_eq!(pool.get(reused).unwrap().texture, Some(60));
    }

    #[test]
    fn test_double_release_is_invalid_handle() {
        let mut pool = ParticlePool::<Probe>::new(3).unwrap();
        let h = pool.acquire(1).unwrap();
        pool.release(h).unwrap();
        assert_eq!(pool.release(h), Err(ChainbornError::InvalidHandle(h)));
        assert_eq!(pool.free_count(), 3);
        assert!(pool.check().is_ok());
        assert_eq!(pool.stats().rejected_releases, 1);
    }

    #[test]
    fn test_stale_handle_cannot_touch_reused_slot() {
        let mut pool = ParticlePool::<Probe>::new(1).unwrap();
        let old = pool.acquire(1).unwrap();
        pool.release(old).unwrap();
        let new = pool.acquire(2).unwrap();
        assert!(pool.get_mut(old).is_none());
        assert!(pool.release(old).is_err());
        assert_eq!(pool.get(new).unwrap().value, 2);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut pool = ParticlePool::<Probe>::new(2).unwrap();
        let foreign = SlotHandle::new(40, 0);
        assert!(matches!(
            pool.release(foreign),
            Err(ChainbornError::InvalidHandle(_))
        ));
        assert!(pool.check().is_ok());
    }

    #[test]
    fn test_conservation_under_random_churn() {
        let mut pool = ParticlePool::<Probe>::new(32).unwrap();
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut live: Vec<SlotHandle> = Vec::new();
        let mut dead: Vec<SlotHandle> = Vec::new();

        for step in 0..5_000u32 {
            match rng.gen_range(0..10) {
                0..=4 => match pool.acquire(step) {
                    Ok(h) => live.push(h),
                    Err(e) => {
                        assert!(pool.is_full());
                        assert!(e.is_recoverable());
                    }
                },
                5..=8 if !live.is_empty() => {
                    let h = live.swap_remove(rng.gen_range(0..live.len()));
                    pool.release(h).unwrap();
                    dead.push(h);
                }
                _ if !dead.is_empty() => {
                    let h = dead[rng.gen_range(0..dead.len())];
                    assert!(pool.release(h).is_err());
                }
                _ => {}
            }
            assert!(conserved(&pool), "step {step}");
            assert_eq!(pool.active_count(), live.len());
        }
        assert!(pool.check().is_ok());
        assert!(pool.validate().is_clean());
        assert!(pool.stats().peak_active <= 32);
    }

    #[test]
    fn test_iter_active_and_clear() {
        let mut pool = ParticlePool::<Probe>::new(5).unwrap();
        let a = pool.acquire(1).unwrap();
        let _b = pool.acquire(2).unwrap();
        let c = pool.acquire(3).unwrap();
        pool.release(a).unwrap();
        let values: Vec<u32> = pool.iter_active().map(|(_, p)| p.value).collect();
        assert_eq!(values, vec![2, 3]);
        for (_, p) in pool.iter_active_mut() {
            p.value += 100;
        }
        assert_eq!(pool.get(c).unwrap().value, 103);

        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), 5);
        assert!(pool.get(c).is_none());
        assert!(pool.check().is_ok());
    }

    #[test]
    fn test_validate_repairs_duplicate_free_index() {
        let mut pool = ParticlePool::<Probe>::new(4).unwrap();
        let h = pool.acquire(1).unwrap();
        pool.free.push(0); // slot 0 is active
        pool.free.push(2); // slot 2 already free
        assert!(matches!(pool.check(), Err(ChainbornError::PoolCorruption(_))));

        let report = pool.validate();
        assert!(report.repaired);
        assert!(!report.reallocated);
        assert!(report.issues.contains(&PoolIssue::DuplicateFreeIndex(2)));
        assert!(report.issues.contains(&PoolIssue::ActiveIndexInFreeList(0)));
        assert_eq!(report.after.free, 3);
        assert!(pool.check().is_ok());
        assert!(pool.contains(h));
        assert!(conserved(&pool));
        assert_eq!(pool.stats().repairs, 1);
    }

    #[test]
    fn test_validate_repairs_leaks_and_out_of_range() {
        let mut pool = ParticlePool::<Probe>::new(4).unwrap();
        pool.free.retain(|i| *i != 3);
        pool.free.push(17);
        let report = pool.validate();
        assert!(report.issues.contains(&PoolIssue::LeakedSlot(3)));
        assert!(report.issues.contains(&PoolIssue::OutOfRangeFreeIndex(17)));
        assert_eq!(pool.free_count(), 4);
        assert!(pool.validate().is_clean());
    }

    #[test]
    fn test_validate_reallocates_drifted_slot_array() {
        let mut pool = ParticlePool::<Probe>::new(3).unwrap();
        let h = pool.acquire(9).unwrap();
        pool.slots.push(Slot::default());
        pool.slots.push(Slot::default());

        let report = pool.validate();
        assert!(report.reallocated);
        assert!(report
            .issues
            .contains(&PoolIssue::SlotArrayDrift { len: 5, capacity: 3 }));
        assert_eq!(pool.slots.len(), 3);
        assert_eq!(pool.get(h).unwrap().value, 9);
        assert!(conserved(&pool));
        assert!(pool.check().is_ok());
    }

    #[test]
    fn test_acquire_skips_stale_free_entries() {
        let mut pool = ParticlePool::<Probe>::new(2).unwrap();
        let a = pool.acquire(1).unwrap();
        pool.free.push(a.index() as u32);
        let b = pool.acquire(2).unwrap();
        assert_ne!(a.index(), b.index());
        assert_eq!(pool.get(a).unwrap().value, 1);
        assert!(pool.check().is_ok());
    }
}

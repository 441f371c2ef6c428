//! Pool diagnostics: detected issues and the repair report

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single invariant violation found by `ParticlePool::check`/`validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolIssue {
    /// The same index appears more than once in the free list
    DuplicateFreeIndex(u32),
    /// A free-list entry points past the arena
    OutOfRangeFreeIndex(u32),
    /// A free-list entry points at an active slot
    ActiveIndexInFreeList(u32),
    /// An inactive slot that the free list does not know about
    LeakedSlot(u32),
    /// Cached active counter disagrees with the slot flags
    ActiveCountDrift { recorded: usize, actual: usize },
    /// `free + active != capacity`
    CountMismatch { free: usize, active: usize, capacity: usize },
    /// Backing array length differs from the declared capacity
    SlotArrayDrift { len: usize, capacity: usize },
}

impl fmt::Display for PoolIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolIssue::DuplicateFreeIndex(i) => write!(f, "duplicate free index {}", i),
            PoolIssue::OutOfRangeFreeIndex(i) => write!(f, "out-of-range free index {}", i),
            PoolIssue::ActiveIndexInFreeList(i) => write!(f, "active slot {} listed as free", i),
            PoolIssue::LeakedSlot(i) => write!(f, "inactive slot {} missing from free list", i),
            PoolIssue::ActiveCountDrift { recorded, actual } => {
                write!(f, "active counter {} but {} slots active", recorded, actual)
            }
            PoolIssue::CountMismatch { free, active, capacity } => {
                write!(f, "free {} + active {} != capacity {}", free, active, capacity)
            }
            PoolIssue::SlotArrayDrift { len, capacity } => {
                write!(f, "slot array length {} != capacity {}", len, capacity)
            }
        }
    }
}

/// Pool occupancy at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCounts {
    pub active: usize,
    pub free: usize,
    pub slots: usize,
}

/// Outcome of `ParticlePool::validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub issues: Vec<PoolIssue>,
    /// Free list and counters were rebuilt
    pub repaired: bool,
    /// The backing slot array was reallocated at the declared capacity
    pub reallocated: bool,
    pub before: PoolCounts,
    pub after: PoolCounts,
}

impl RepairReport {
    pub(crate) fn clean(counts: PoolCounts) -> Self {
        Self {
            issues: Vec::new(),
            repaired: false,
            reallocated: false,
            before: counts,
            after: counts,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            return format!(
                "pool healthy | active={} free={}",
                self.after.active, self.after.free
            );
        }
        let issues: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        format!(
            "pool repaired | {} issue(s): {} | active {}->{} free {}->{}{}",
            self.issues.len(),
            issues.join("; "),
            self.before.active,
            self.after.active,
            self.before.free,
            self.after.free,
            if self.reallocated { " | slots reallocated" } else { "" },
        )
    }
}

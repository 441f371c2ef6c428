//! MutationHistory: append-only, hash-chained record of trait changes
//!
//! Each record is linked to its predecessor through a SHA-256 chain, so a
//! history loaded back from a snapshot can be checked for truncation or
//! edits with `verify_chain`.

use super::{Shape, TraitCategory, TraitField};
use crate::allocation::Role;
use crate::evolution::{Milestone, RarityTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Which value a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutatedField {
    Trait(TraitField),
    Shape,
    Role,
    Members,
}

impl MutatedField {
    pub fn category(self) -> TraitCategory {
        match self {
            MutatedField::Trait(field) => field.category(),
            MutatedField::Shape => TraitCategory::Visual,
            MutatedField::Role => TraitCategory::Behavioral,
            MutatedField::Members => TraitCategory::Physical,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MutatedField::Trait(field) => field.name(),
            MutatedField::Shape => "shape",
            MutatedField::Role => "role",
            MutatedField::Members => "members",
        }
    }
}

/// Before/after value of a mutated field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraitValue {
    Number(f64),
    Shape(Shape),
    Role(Role),
    Count(u32),
}

impl TraitValue {
    fn digest_into(&self, hasher: &mut Sha256) {
        match self {
            TraitValue::Number(v) => {
                hasher.update(b"n");
                hasher.update(v.to_bits().to_le_bytes());
            }
            TraitValue::Shape(s) => {
                hasher.update(b"s");
                hasher.update((s.index() as u32).to_le_bytes());
            }
            TraitValue::Role(r) => {
                hasher.update(b"r");
                hasher.update((r.index() as u32).to_le_bytes());
            }
            TraitValue::Count(c) => {
                hasher.update(b"c");
                hasher.update(c.to_le_bytes());
            }
        }
    }
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraitValue::Number(v) => write!(f, "{:.4}", v),
            TraitValue::Shape(s) => write!(f, "{:?}", s),
            TraitValue::Role(r) => write!(f, "{}", r),
            TraitValue::Count(c) => write!(f, "{}", c),
        }
    }
}

/// One change to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub timestamp: DateTime<Utc>,
    /// Milestone that triggered the change; `None` for ambient drift
    pub milestone: Option<Milestone>,
    pub category: TraitCategory,
    pub field: MutatedField,
    pub old_value: TraitValue,
    pub new_value: TraitValue,
    pub rarity: RarityTier,
    /// Chain link, filled in by `MutationHistory::append`
    pub hash: String,
}

impl MutationRecord {
    pub fn new(
        field: MutatedField,
        old_value: TraitValue,
        new_value: TraitValue,
        milestone: Option<Milestone>,
        rarity: RarityTier,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            milestone,
            category: field.category(),
            field,
            old_value,
            new_value,
            rarity,
            hash: String::new(),
        }
    }
}

impl fmt::Display for MutationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {} -> {} ({:?})",
            self.category,
            self.field.name(),
            self.old_value,
            self.new_value,
            self.rarity
        )
    }
}

/// Ordered, append-only mutation log owned by a `TraitSet`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationHistory {
    records: Vec<MutationRecord>,
    head: String,
}

impl Default for MutationHistory {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            head: Self::genesis_hash(),
        }
    }
}

impl MutationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link and append a record; returns the new head hash
    pub fn append(&mut self, mut record: MutationRecord) -> &str {
        record.hash = Self::chain_hash(&self.head, &record);
        self.head = record.hash.clone();
        self.records.push(record);
        &self.head
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = MutationRecord>) {
        for record in records {
            self.append(record);
        }
    }

    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&MutationRecord> {
        self.records.last()
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    /// Records triggered by a given milestone
    pub fn for_milestone(&self, milestone: Milestone) -> impl Iterator<Item = &MutationRecord> {
        self.records
            .iter()
            .filter(move |r| r.milestone == Some(milestone))
    }

    /// Recompute every link from the genesis hash
    pub fn verify_chain(&self) -> bool {
        let mut prev = Self::genesis_hash();
        for record in &self.records {
            let expected = Self::chain_hash(&prev, record);
            if expected != record.hash {
                return false;
            }
            prev = expected;
        }
        prev == self.head
    }

    fn genesis_hash() -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"chainborn-history-genesis");
        hex::encode(hasher.finalize())
    }

    fn chain_hash(prev_hash: &str, record: &MutationRecord) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prev_hash.as_bytes());
        hasher.update(record.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(
            record
                .milestone
                .map(|m| m.threshold())
                .unwrap_or(0)
                .to_le_bytes(),
        );
        hasher.update(record.field.name().as_bytes());
        record.old_value.digest_into(&mut hasher);
        record.new_value.digest_into(&mut hasher);
        hasher.update((record.rarity.index() as u32).to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(old: f64, new: f64) -> MutationRecord {
        MutationRecord::new(
            MutatedField::Trait(TraitField::Speed),
            TraitValue::Number(old),
            TraitValue::Number(new),
            Some(Milestone::TenThousand),
            RarityTier::Common,
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_history_verifies() {
        let history = MutationHistory::new();
        assert!(history.is_empty());
        assert!(history.verify_chain());
    }

    #[test]
    fn test_append_links_records() {
        let mut history = MutationHistory::new();
        let genesis_head = history.head().to_string();
        history.append(record(1.0, 1.5));
        history.append(record(1.5, 2.0));
        assert_eq!(history.len(), 2);
        assert_ne!(history.head(), genesis_head);
        assert_eq!(history.records()[0].category, TraitCategory::Behavioral);
        assert!(history.verify_chain());
        assert_eq!(history.for_milestone(Milestone::TenThousand).count(), 2);
        assert_eq!(history.for_milestone(Milestone::OneMillion).count(), 0);
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut history = MutationHistory::new();
        for i in 0..5 {
            history.append(record(i as f64, i as f64 + 0.5));
        }
        let mut tampered = history.clone();
        tampered.records[2].new_value = TraitValue::Number(4.9);
        assert!(!tampered.verify_chain());

        let mut truncated = history.clone();
        truncated.records.pop();
        assert!(!truncated.verify_chain());
    }

    #[test]
    fn test_json_round_trip_keeps_chain() {
        let mut history = MutationHistory::new();
        history.append(record(0.123_456_789, 0.987_654_321));
        history.append(MutationRecord::new(
            MutatedField::Role,
            TraitValue::Role(Role::Scout),
            TraitValue::Role(Role::Guardian),
            None,
            RarityTier::Mythic,
            Utc::now(),
        ));
        let json = serde_json::to_string(&history).unwrap();
        let restored: MutationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, history);
        assert!(restored.verify_chain());
    }
}

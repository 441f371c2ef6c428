//! Error kinds shared by every Chainborn subsystem
//!
//! Only `Configuration` is fatal (raised while building a population).
//! `PoolExhausted`, `InvalidHandle` and the organism lookup errors are
//! expected during normal running and must be handled by the caller's
//! update loop, never unwrapped.

use crate::pool::SlotHandle;
use crate::population::OrganismId;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ChainbornError>;

/// Chainborn errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainbornError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Allocation error: {0}")]
    Allocation(String),

    #[error("Pool exhausted: all {capacity} slots are active")]
    PoolExhausted { capacity: usize },

    #[error("Invalid handle: {0}")]
    InvalidHandle(SlotHandle),

    #[error("Pool corruption: {0}")]
    PoolCorruption(String),

    #[error("Unknown organism: {0}")]
    UnknownOrganism(OrganismId),

    #[error("Organism already present: {0}")]
    DuplicateOrganism(OrganismId),
}

impl ChainbornError {
    /// Errors the update loop is expected to absorb and keep running
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. }
                | Self::InvalidHandle(_)
                | Self::UnknownOrganism(_)
                | Self::DuplicateOrganism(_)
        )
    }

    /// Errors that should abort startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(ChainbornError::PoolExhausted { capacity: 3 }.is_recoverable());
        assert!(ChainbornError::Configuration("bad".into()).is_fatal());
        assert!(!ChainbornError::Configuration("bad".into()).is_recoverable());
        assert!(!ChainbornError::PoolCorruption("dup".into()).is_fatal());
        assert!(!ChainbornError::Allocation("sum".into()).is_recoverable());

        let id = OrganismId::derive(crate::rng::Seed::new(1), chrono::Utc::now(), 0);
        assert!(ChainbornError::UnknownOrganism(id.clone()).is_recoverable());
        assert!(ChainbornError::DuplicateOrganism(id).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = ChainbornError::PoolExhausted { capacity: 3 };
        assert_eq!(err.to_string(), "Pool exhausted: all 3 slots are active");
    }
}

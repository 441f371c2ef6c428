//! Seed: the validated 32-bit input behind every generation event
//!
//! Block nonces arrive from outside as decimal strings, `0x` hex strings or
//! wide integers. Anything that does not fit in a `u32` is rejected here so
//! the generators never see a truncated value.

use crate::error::{ChainbornError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-bit generation seed (typically a block nonce)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seed(u32);

impl Seed {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Seed {
    type Error = ChainbornError;

    fn try_from(value: u64) -> Result<Self> {
        u32::try_from(value).map(Seed).map_err(|_| {
            ChainbornError::Configuration(format!("seed {} does not fit in 32 bits", value))
        })
    }
}

impl TryFrom<i64> for Seed {
    type Error = ChainbornError;

    fn try_from(value: i64) -> Result<Self> {
        u32::try_from(value).map(Seed).map_err(|_| {
            ChainbornError::Configuration(format!("seed {} is not an unsigned 32-bit value", value))
        })
    }
}

impl FromStr for Seed {
    type Err = ChainbornError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
            None => trimmed.parse::<u64>(),
        };
        let value = parsed.map_err(|e| {
            ChainbornError::Configuration(format!("invalid seed '{}': {}", trimmed, e))
        })?;
        Seed::try_from(value)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! RngState: the deterministic 32-bit generator behind every draw
//!
//! The transformation is Mulberry32: a Weyl increment followed by an
//! integer avalanche. Only wrapping integer arithmetic touches the state,
//! so the same seed yields the same sequence on every platform. Floats are
//! derived from the integer output and never fed back.

use super::Seed;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const WEYL_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Deterministic generator state (32 bits, `Copy`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngState {
    state: u32,
}

impl RngState {
    /// Seed a fresh stream
    pub fn seed(seed: impl Into<Seed>) -> Self {
        Self {
            state: seed.into().value(),
        }
    }

    /// Functional step: returns the next value and the advanced state
    pub fn next(self) -> (u32, Self) {
        let mut advanced = self;
        let value = advanced.draw();
        (value, advanced)
    }

    /// Advance in place and return the next 32-bit value
    pub fn draw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Derive an independent sub-stream for a named purpose.
    ///
    /// The sub-stream is seeded from `SHA-256(state || purpose)`, so it depends
    /// on the current position of this stream but does not advance it.
    pub fn derive(&self, purpose: &str) -> RngState {
        let mut hasher = Sha256::new();
        hasher.update(self.state.to_le_bytes());
        hasher.update(purpose.as_bytes());
        let digest = hasher.finalize();
        let reseed = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        RngState { state: reseed }
    }

    /// Uniform `f64` in `[0, 1)` from a single draw
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.draw()) / TWO_POW_32
    }

    /// Uniform value in `[min, max)` from a single draw
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Index in `[0, n)` by modulo, one draw. Returns 0 for `n == 0`.
    pub fn below(&mut self, n: u32) -> u32 {
        let value = self.draw();
        if n == 0 {
            0
        } else {
            value % n
        }
    }

    /// True with probability `p` (one draw)
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Raw state, for diagnostics and snapshots
    pub fn raw(&self) -> u32 {
        self.state
    }
}

impl rand::RngCore for RngState {
    fn next_u32(&mut self) -> u32 {
        self.draw()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.draw());
        let low = u64::from(self.draw());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.draw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl rand::SeedableRng for RngState {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        RngState::seed(u32::from_le_bytes(seed))
    }
}

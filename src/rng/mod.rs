//! Deterministic randomness for Chainborn
//!
//! A single integer seed (usually a block nonce) drives every random
//! decision. Subsystems never share a stream: each derives its own named
//! sub-stream, so adding draws in one place cannot shift another.

mod seed;
mod stream;

pub use seed::Seed;
pub use stream::RngState;

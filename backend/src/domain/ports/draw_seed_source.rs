//! Port supplying draw seeds.
//!
//! Production draws use operating-system randomness; tests pin the seed so
//! draws are reproducible.

/// Source of 64-bit seeds for the draw solver.
#[cfg_attr(test, mockall::automock)]
pub trait DrawSeedSource: Send + Sync {
    /// Produce the seed for the next draw attempt.
    fn next_seed(&self) -> u64;
}

/// Seed source that always returns the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDrawSeedSource {
    seed: u64,
}

impl FixedDrawSeedSource {
    /// Create a source that always yields `seed`.
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DrawSeedSource for FixedDrawSeedSource {
    fn next_seed(&self) -> u64 {
        self.seed
    }
}

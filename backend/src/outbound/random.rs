//! Operating-system randomness for draw seeds.

use rand::rngs::OsRng;
use rand::{RngCore, TryRngCore};
use tracing::warn;

use crate::domain::ports::DrawSeedSource;

/// Seed source backed by the operating system's CSPRNG.
///
/// Falls back to the thread-local generator, itself seeded from the
/// operating system, when the OS source reports an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsDrawSeedSource;

impl DrawSeedSource for OsDrawSeedSource {
    fn next_seed(&self) -> u64 {
        OsRng.try_next_u64().unwrap_or_else(|error| {
            warn!(%error, "OS randomness unavailable; drawing the seed from the thread generator");
            rand::rng().next_u64()
        })
    }
}

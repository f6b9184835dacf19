//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests and replays,
//! a seeded or scripted implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG backed by `StdRng`.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Creates an RNG with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_rng_stays_within_inclusive_bounds() {
        let mut rng = SystemRng::seeded(7);
        for _ in 0..1_000 {
            let value = rng.next_u32_range(1, 6);
            assert!((1..=6).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn test_seeded_rngs_are_reproducible() {
        let mut a = SystemRng::seeded(42);
        let mut b = SystemRng::seeded(42);
        let first: Vec<u32> = (0..16).map(|_| a.next_u32_range(1, 1000)).collect();
        let second: Vec<u32> = (0..16).map(|_| b.next_u32_range(1, 1000)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_range_returns_bound() {
        let mut rng = SystemRng::from_entropy();
        assert_eq!(rng.next_u32_range(3, 3), 3);
    }
}

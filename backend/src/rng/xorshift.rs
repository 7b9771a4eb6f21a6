//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for simulation purposes.
//!
//! # Determinism
//!
//! Same (seed, run) pair → same sequence of random numbers. Different run
//! numbers with the same seed give independent-looking streams, which is how
//! repeated scenario runs are made statistically distinct but reproducible.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use mmwave_ca_scenario_core::RngManager;
///
/// let mut rng = RngManager::for_run(1, 1);
/// let value = rng.next();
/// let angle = rng.uniform(0.0, std::f64::consts::TAU);
/// assert!(angle >= 0.0 && angle < std::f64::consts::TAU);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Create the RNG for one run of a seeded experiment
    ///
    /// The seed and run number are mixed with splitmix64 so that runs 1, 2,
    /// 3... of the same seed start from well-separated states.
    pub fn for_run(seed: u64, run: u64) -> Self {
        let mixed = splitmix64(seed ^ splitmix64(run));
        Self::new(mixed)
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) by dividing by 2^53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate random f64 in range [min, max)
    ///
    /// A degenerate interval (`min == max`) always returns `min`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        assert!(min <= max, "min must not exceed max");
        min + (max - min) * self.next_f64()
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let mut zero = RngManager::new(0);
        let mut one = RngManager::new(1);
        for _ in 0..3 {
            let value = zero.next();
            assert_ne!(value, 0, "Zero seed should be converted to 1");
            assert_eq!(value, one.next());
        }
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn test_uniform_degenerate_interval() {
        let mut rng = RngManager::new(7);
        assert_eq!(rng.uniform(3.0, 3.0), 3.0);
    }

    #[test]
    fn test_runs_of_same_seed_differ() {
        let mut run1 = RngManager::for_run(1, 1);
        let mut run2 = RngManager::for_run(1, 2);
        assert_ne!(run1.next(), run2.next());
    }
}

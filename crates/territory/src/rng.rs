//! Seeded randomness for the simulation.
//!
//! Every random choice the game makes (enemy headings, spawn spots, power-up
//! kinds, snake walls) is drawn from one `Rng` owned by the `Game`, so a run
//! is fully reproducible from its seed.

use std::f64::consts::TAU;

/// A fast, deterministic pseudo-random number generator.
///
/// Linear Congruential Generator with the Numerical Recipes constants.
///
/// # Example
/// ```
/// use territory::rng::Rng;
///
/// let mut rng = Rng::new(12345);
/// let heading = rng.next_angle(); // radians in [0, 2π)
/// assert!(heading >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed.
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { state: seed.wrapping_add(1) }
    }

    /// Get the next raw u64 value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Get a random f64 in the range [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        // high bits are the better-distributed ones
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Get a random f64 in the range [min, max).
    #[inline]
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// A heading in radians, uniform over the full circle.
    #[inline]
    pub fn next_angle(&mut self) -> f64 {
        self.next_f64() * TAU
    }

    /// `true` with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Get a random index in the range [0, len). Zero for an empty range.
    #[inline]
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// Pick a random element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_index(items.len()))
        }
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(0)
    }
}

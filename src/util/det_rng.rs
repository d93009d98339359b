//! Deterministic pseudo-random number generator.
//!
//! A small xorshift64 generator. Each worker owns one, derived from the run
//! seed, so a run's simulated durations are reproducible from that seed
//! alone.
//!
//! # Determinism
//!
//! Given the same seed, the sequence of generated numbers is always identical.

/// A deterministic pseudo-random number generator using xorshift64.
///
/// It is NOT cryptographically secure.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// Creates a new PRNG with the given seed.
    ///
    /// The seed must be non-zero. If zero is provided, it will be replaced with 1.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generates the next pseudo-random u64 value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generates a pseudo-random value in the range [0, bound).
    ///
    /// Uses rejection sampling to avoid modulo bias.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "bound must be non-zero");
        let threshold = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < threshold {
                return value % bound;
            }
        }
    }

    /// Generates a pseudo-random value uniformly in the inclusive range
    /// `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn next_inclusive(&mut self, min: u64, max: u64) -> u64 {
        assert!(min <= max, "empty range [{min}, {max}]");
        match (max - min).checked_add(1) {
            Some(span) => min + self.next_below(span),
            // Full u64 range.
            None => self.next_u64(),
        }
    }
}

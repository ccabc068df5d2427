//! Test RNGs — deterministic `DeterministicRng` implementations for tests.

use treasure_core::rng::DeterministicRng;

/// An RNG that returns the same draw forever. Story checkpoints fail when
/// the draw is below their probability, so a high draw forces success and
/// a zero draw forces failure.
#[derive(Debug, Clone, Copy)]
pub struct FixedRng(pub f64);

impl FixedRng {
    /// Passes every checkpoint with a probability below `0.99`.
    #[must_use]
    pub fn always_pass() -> Self {
        Self(0.99)
    }

    /// Fails every checkpoint with a non-zero probability.
    #[must_use]
    pub fn always_fail() -> Self {
        Self(0.0)
    }
}

impl DeterministicRng for FixedRng {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// An RNG that returns draws from a predetermined sequence. Panics if the
/// sequence is exhausted. Used in tests that need a specific run of
/// checkpoint outcomes (e.g., fail once, then pass on replay).
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<f64>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given draws.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_f64(&mut self) -> f64 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }
}

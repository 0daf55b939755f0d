//! Injectable Randomness
//!
//! Several rules of the experience are deliberately probabilistic: the badge
//! award chance, the glitch chance on a spiral tick, the narrator skip chance,
//! typing delays and line selection. All of them draw from a [`RandomSource`]
//! owned by the session, so a test (or a replay) can swap in a scripted
//! sequence and assert exact outcomes.

use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform random values.
///
/// Implementors only provide [`RandomSource::next_unit`]; the helpers built on
/// top of it are shared so every source maps values to outcomes identically.
pub trait RandomSource: Send {
    /// Next uniform value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Bernoulli trial. `probability` is clamped to `[0, 1]`; NaN never fires.
    fn chance(&mut self, probability: f64) -> bool {
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.next_unit() < p
    }

    /// Uniform index into a collection of `len` items
    fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (self.next_unit() * len as f64) as usize;
        Some(idx.min(len - 1))
    }

    /// Uniform duration in `[lo, hi]`. An inverted range yields `lo`.
    fn between(&mut self, lo: Duration, hi: Duration) -> Duration {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo).as_secs_f64();
        lo + Duration::from_secs_f64(span * self.next_unit())
    }
}

/// Production source backed by `rand`'s `StdRng`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source for a given seed
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Plays back a fixed list of values, then repeats `fallback` forever.
///
/// Values are clamped into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    /// Script that plays `values` in order, then `fallback`
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback,
        }
    }

    /// Script that always returns the same value
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([], value)
    }

    /// Append more values to the script
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
    }

    /// Values not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        let v = self.values.pop_front().unwrap_or(self.fallback);
        if v.is_nan() {
            0.0
        } else {
            v.clamp(0.0, 0.999_999)
        }
    }
}

//! Request sampling
//!
//! The decision is a pure function of a uniform draw in `[0, 1)` and the
//! configured rate. [`Sampler`] owns the RNG and can be seeded so tests get
//! a reproducible sequence.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Whether a request with uniform `draw` in `[0, 1)` is kept at `rate`
#[inline]
pub fn should_sample(rate: f64, draw: f64) -> bool {
    draw < rate
}

/// Thread-safe sampler with a fixed rate
pub struct Sampler {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Sampler seeded from OS entropy
    ///
    /// `rate` must already be validated to lie in `[0, 1]`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sampler for tests and replays
    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self {
            rate,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Draw once and decide
    pub fn sample(&self) -> bool {
        // Skip the lock at the extremes
        if self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }

        let draw: f64 = self.rng.lock().gen();
        should_sample(self.rate, draw)
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").field("rate", &self.rate).finish()
    }
}

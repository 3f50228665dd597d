//! Injectable randomness for demo traffic.
//!
//! Every random decision a handler makes (synthetic ids, simulated latency,
//! simulated failures, fake system readings) goes through [`RandomSource`],
//! so tests can replace the thread RNG with a scripted sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Source of the random draws used by the request handlers.
pub trait RandomSource: Send + Sync {
    /// Uniform float in `[0, 1)`.
    fn next_float(&self) -> f64;

    /// Uniform integer in `[0, bound)`. Returns 0 when `bound` is 0.
    fn next_below(&self, bound: u64) -> u64;

    /// Uniform duration in `[0, max)` with millisecond granularity.
    fn next_duration(&self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.next_below(max_ms))
    }

    /// `true` with probability `1 / one_in`.
    fn chance(&self, one_in: u64) -> bool {
        self.next_below(one_in) == 0
    }
}

/// Draws from the per-thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_float(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn next_below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Reproducible RNG seeded once at startup.
///
/// All handlers share one generator, so the sequence of draws depends on
/// request interleaving, but a single-client replay is deterministic.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen::<f64>()
    }

    fn next_below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..bound)
    }
}

/// Replays fixed sequences of draws.
///
/// Integers are reduced modulo the requested bound and floats are wrapped
/// into `[0, 1)`, so any script stays within each draw's contract. An
/// exhausted script yields zeros.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    floats: Mutex<VecDeque<f64>>,
    ints: Mutex<VecDeque<u64>>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue values returned by [`RandomSource::next_float`].
    #[must_use]
    pub fn with_floats(self, floats: impl IntoIterator<Item = f64>) -> Self {
        self.floats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(floats);
        self
    }

    /// Queue values returned by [`RandomSource::next_below`].
    #[must_use]
    pub fn with_ints(self, ints: impl IntoIterator<Item = u64>) -> Self {
        self.ints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ints);
        self
    }

    /// Number of integer draws not yet consumed.
    pub fn remaining_ints(&self) -> usize {
        self.ints.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_float(&self) -> f64 {
        let value = self
            .floats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(0.0);
        let wrapped = value.rem_euclid(1.0);
        if wrapped.is_finite() {
            wrapped
        } else {
            0.0
        }
    }

    fn next_below(&self, bound: u64) -> u64 {
        let value = self
            .ints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(0);
        if bound == 0 {
            0
        } else {
            value % bound
        }
    }
}

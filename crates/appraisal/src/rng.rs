//! Injectable randomness.
//!
//! Production code draws from the thread-local RNG (or a seeded one when a
//! seed is configured); tests use a seeded [`SeededRandom`] for
//! reproducible draws.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform integer in `[min, max]`.
    fn range_inclusive(&self, min: i64, max: i64) -> i64;

    /// Uniform draw in `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        low + self.unit() * (high - low)
    }
}

/// Thread-local RNG, seeded from the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl ThreadRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }

    fn range_inclusive(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Deterministic RNG shared behind a mutex.
#[derive(Debug)]
pub struct SeededRandom {
    inner: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave StdRng half-updated.
        let mut rng = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn unit(&self) -> f64 {
        self.with_rng(|rng| rng.gen_range(0.0..1.0))
    }

    fn range_inclusive(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.with_rng(|rng| rng.gen_range(min..=max))
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Arc<T> {
    fn unit(&self) -> f64 {
        (**self).unit()
    }

    fn range_inclusive(&self, min: i64, max: i64) -> i64 {
        (**self).range_inclusive(min, max)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn unit(&self) -> f64 {
        (**self).unit()
    }

    fn range_inclusive(&self, min: i64, max: i64) -> i64 {
        (**self).range_inclusive(min, max)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &T {
    fn unit(&self) -> f64 {
        (**self).unit()
    }

    fn range_inclusive(&self, min: i64, max: i64) -> i64 {
        (**self).range_inclusive(min, max)
    }
}

//! Appraisal settings, read from the environment.

use tracing::warn;

use crate::rng::{RandomSource, SeededRandom, ThreadRandom};
use crate::roll::DEFAULT_DIE_SIDES;

pub const ENV_RNG_SEED: &str = "HOARD_RNG_SEED";
pub const ENV_REUSE_EPSILON: &str = "HOARD_REUSE_EPSILON";
pub const ENV_DIE_SIDES: &str = "HOARD_DIE_SIDES";

pub const DEFAULT_REUSE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct AppraisalConfig {
    /// Seed for reproducible sessions; entropy-seeded when `None`.
    pub rng_seed: Option<u64>,
    /// True values closer than this count as identical for reuse.
    pub reuse_epsilon: f64,
    pub die_sides: i32,
}

impl Default for AppraisalConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            reuse_epsilon: DEFAULT_REUSE_EPSILON,
            die_sides: DEFAULT_DIE_SIDES,
        }
    }
}

impl AppraisalConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Invalid values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_RNG_SEED) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.rng_seed = Some(seed),
                Err(_) => warn!(key = ENV_RNG_SEED, value = %raw, "ignoring invalid rng seed"),
            }
        }

        if let Some(raw) = lookup(ENV_REUSE_EPSILON) {
            match raw.trim().parse::<f64>() {
                Ok(eps) if eps.is_finite() && eps >= 0.0 => config.reuse_epsilon = eps,
                _ => warn!(key = ENV_REUSE_EPSILON, value = %raw, "ignoring invalid reuse epsilon"),
            }
        }

        if let Some(raw) = lookup(ENV_DIE_SIDES) {
            match raw.trim().parse::<i32>() {
                Ok(sides) if sides >= 2 => config.die_sides = sides,
                _ => warn!(key = ENV_DIE_SIDES, value = %raw, "ignoring invalid die sides"),
            }
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// The random source these settings call for.
    pub fn random_source(&self) -> Box<dyn RandomSource> {
        match self.rng_seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom::new()),
        }
    }
}

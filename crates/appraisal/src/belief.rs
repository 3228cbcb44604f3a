//! Belief generation: what a character *thinks* an item is worth.
//!
//! Accuracy depends on the total skill roll:
//! - `roll >= 20`: exact
//! - `15 <= roll < 20`: true value × U[0.8, 1.2]
//! - `roll < 15`: true value × U[0.1, 3.0]; a worthless item instead gets a
//!   flat whole-number guess in `1..=100`
//!
//! Non-exact results go through [`humanize`]. Outside the exact band the
//! result is intentionally non-deterministic.

use serde::{Deserialize, Serialize};

use crate::error::AppraisalError;
use crate::rng::RandomSource;
use crate::rounding::humanize;

pub const EXACT_THRESHOLD: i32 = 20;
pub const CLOSE_THRESHOLD: i32 = 15;

pub const CLOSE_RANGE: (f64, f64) = (0.8, 1.2);
pub const WILD_RANGE: (f64, f64) = (0.1, 3.0);
pub const WORTHLESS_GUESS: (i64, i64) = (1, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyBand {
    Exact,
    Close,
    Wild,
}

impl AccuracyBand {
    pub fn for_roll(roll: i32) -> Self {
        if roll >= EXACT_THRESHOLD {
            AccuracyBand::Exact
        } else if roll >= CLOSE_THRESHOLD {
            AccuracyBand::Close
        } else {
            AccuracyBand::Wild
        }
    }

    /// Band for a stored appraisal. Appraisals copied from an identical item
    /// carry no roll and are treated as uninformed guesses.
    pub fn for_recorded_roll(roll: Option<i32>) -> Self {
        roll.map(Self::for_roll).unwrap_or(AccuracyBand::Wild)
    }
}

/// A believed value before the human-ish rounding pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBelief {
    pub band: AccuracyBand,
    pub value: f64,
    /// Flat guess for a worthless item (no multiplier involved).
    pub flat_guess: bool,
}

/// Draw an un-rounded belief for a band.
pub fn draw(
    true_value: f64,
    band: AccuracyBand,
    rng: &dyn RandomSource,
) -> Result<RawBelief, AppraisalError> {
    if !true_value.is_finite() {
        return Err(AppraisalError::InvalidTrueValue(true_value));
    }

    let (value, flat_guess) = match band {
        AccuracyBand::Exact => (true_value, false),
        AccuracyBand::Close => (true_value * rng.uniform(CLOSE_RANGE.0, CLOSE_RANGE.1), false),
        AccuracyBand::Wild if true_value == 0.0 => {
            let guess = rng.range_inclusive(WORTHLESS_GUESS.0, WORTHLESS_GUESS.1);
            (guess as f64, true)
        }
        AccuracyBand::Wild => (true_value * rng.uniform(WILD_RANGE.0, WILD_RANGE.1), false),
    };

    Ok(RawBelief {
        band,
        value,
        flat_guess,
    })
}

/// Produce a believed value for a band, rounding non-exact results.
///
/// Flat guesses for worthless items are already whole numbers and skip the
/// rounding pass so they stay within `1..=100`.
pub fn believe_in_band(
    true_value: f64,
    band: AccuracyBand,
    rng: &dyn RandomSource,
) -> Result<f64, AppraisalError> {
    let raw = draw(true_value, band, rng)?;
    let believed = match raw.band {
        AccuracyBand::Exact => raw.value,
        _ if raw.flat_guess => raw.value,
        _ => humanize(raw.value, rng),
    };
    if !believed.is_finite() {
        return Err(AppraisalError::NonFiniteBelief(true_value));
    }
    Ok(believed)
}

/// Produce a believed value from a total skill roll.
pub fn believe(true_value: f64, roll: i32, rng: &dyn RandomSource) -> Result<f64, AppraisalError> {
    believe_in_band(true_value, AccuracyBand::for_roll(roll), rng)
}

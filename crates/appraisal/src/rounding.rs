//! "Human-ish" rounding of believed values.
//!
//! People quote appraisals as round-looking numbers. After picking a
//! precision (hundredths 15%, tenths 25%, whole units 60%), the last kept
//! digit is usually nudged so it ends in 0 or 5.

use crate::rng::RandomSource;

const HUNDREDTHS_CUTOFF: f64 = 0.15;
const TENTHS_CUTOFF: f64 = 0.40;

const HUNDREDTHS_NUDGE: f64 = 0.99;
const TENTHS_NUDGE: f64 = 0.75;
const UNITS_NUDGE: f64 = 0.5;

/// Move the last digit of an integral `scaled` value to 0 or 5.
///
/// Digits 0..=2 and 8..=9 drop to 0, 3..=7 become 5.
fn nudge_last_digit(scaled: f64) -> f64 {
    let last = scaled.rem_euclid(10.0).round() as i64;
    let adjust = if last <= 2 || last >= 8 { -last } else { 5 - last };
    scaled + adjust as f64
}

/// Round `value` the way a person quoting a price would.
pub fn humanize(value: f64, rng: &dyn RandomSource) -> f64 {
    let r = rng.unit();
    let (factor, nudge_chance) = if r < HUNDREDTHS_CUTOFF {
        (100.0, HUNDREDTHS_NUDGE)
    } else if r < TENTHS_CUTOFF {
        (10.0, TENTHS_NUDGE)
    } else {
        (1.0, UNITS_NUDGE)
    };

    let mut scaled = (value * factor).round();
    if rng.unit() < nudge_chance {
        scaled = nudge_last_digit(scaled);
    }
    scaled / factor
}

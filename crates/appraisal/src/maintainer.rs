//! Keeps believed values consistent with true values.
//!
//! Both entry points are pure: they take snapshots and return what should be
//! written. The caller persists the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hoard_valuation::ComparisonKey;

use crate::belief::{AccuracyBand, believe, believe_in_band};
use crate::error::AppraisalError;
use crate::record::{Appraisal, PriorAppraisal};
use crate::rng::RandomSource;
use crate::roll::SkillRoll;

/// How to obtain the skill roll if a fresh roll is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSpec {
    pub bonus: i32,
    pub sides: i32,
    /// A die result entered by hand; rolled from the RNG when `None`.
    pub manual_die: Option<i32>,
}

impl RollSpec {
    pub fn resolve(&self, rng: &dyn RandomSource) -> Result<SkillRoll, AppraisalError> {
        match self.manual_die {
            Some(die) => SkillRoll::manual(die, self.bonus, self.sides),
            None => Ok(SkillRoll::roll(rng, self.bonus, self.sides)),
        }
    }
}

/// Outcome of a new appraisal request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppraisalDecision {
    /// Copied from the character's prior appraisal of an identical item.
    Reused { believed_value: f64 },
    Rolled { roll: SkillRoll, believed_value: f64 },
}

impl AppraisalDecision {
    pub fn believed_value(&self) -> f64 {
        match self {
            AppraisalDecision::Reused { believed_value }
            | AppraisalDecision::Rolled { believed_value, .. } => *believed_value,
        }
    }

    /// The total roll to persist, if one was made.
    pub fn recorded_roll(&self) -> Option<i32> {
        match self {
            AppraisalDecision::Reused { .. } => None,
            AppraisalDecision::Rolled { roll, .. } => Some(roll.total()),
        }
    }
}

/// Believed value from the first prior appraisal of an identical item.
pub fn find_reusable(
    priors: &[PriorAppraisal],
    key: &ComparisonKey,
    epsilon: f64,
) -> Option<f64> {
    priors
        .iter()
        .find(|p| p.key.matches(key, epsilon))
        .map(|p| p.believed_value)
}

/// Decide the believed value for a new character/instance appraisal.
///
/// `priors` are the same character's appraisals of other instances.
pub fn decide(
    key: &ComparisonKey,
    priors: &[PriorAppraisal],
    epsilon: f64,
    roll: RollSpec,
    rng: &dyn RandomSource,
) -> Result<AppraisalDecision, AppraisalError> {
    let true_value = key.true_value.ok_or(AppraisalError::NoValue)?;
    if !true_value.is_finite() {
        return Err(AppraisalError::InvalidTrueValue(true_value));
    }

    if let Some(believed_value) = find_reusable(priors, key, epsilon) {
        return Ok(AppraisalDecision::Reused { believed_value });
    }

    let roll = roll.resolve(rng)?;
    let believed_value = believe(true_value, roll.total(), rng)?;
    Ok(AppraisalDecision::Rolled {
        roll,
        believed_value,
    })
}

/// Per-record result of a recompute pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeOutcome {
    /// Updated record on success; the untouched original on failure.
    pub appraisal: Appraisal,
    pub result: Result<(), AppraisalError>,
}

impl RecomputeOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Recompute every appraisal of one instance against its new true value.
///
/// Each record keeps its roll and is processed independently; a failure on
/// one never stops the others.
pub fn recompute(
    new_true_value: f64,
    appraisals: &[Appraisal],
    rng: &dyn RandomSource,
    now: DateTime<Utc>,
) -> Vec<RecomputeOutcome> {
    appraisals
        .iter()
        .map(|original| {
            let band = AccuracyBand::for_recorded_roll(original.roll);
            match believe_in_band(new_true_value, band, rng) {
                Ok(believed_value) => RecomputeOutcome {
                    appraisal: Appraisal {
                        believed_value,
                        updated_at: now,
                        ..original.clone()
                    },
                    result: Ok(()),
                },
                Err(err) => RecomputeOutcome {
                    appraisal: original.clone(),
                    result: Err(err),
                },
            }
        })
        .collect()
}

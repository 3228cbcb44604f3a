//! Skill rolls: a die result plus the character's appraisal bonus.

use serde::{Deserialize, Serialize};

use crate::error::AppraisalError;
use crate::rng::RandomSource;

pub const DEFAULT_DIE_SIDES: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRoll {
    pub die: i32,
    pub bonus: i32,
}

impl SkillRoll {
    /// A physical die result entered by hand; must lie in `1..=sides`.
    pub fn manual(die: i32, bonus: i32, sides: i32) -> Result<Self, AppraisalError> {
        if !(1..=sides).contains(&die) {
            return Err(AppraisalError::InvalidRoll(format!(
                "die result {die} is outside 1..={sides}"
            )));
        }
        Ok(Self { die, bonus })
    }

    pub fn roll(rng: &dyn RandomSource, bonus: i32, sides: i32) -> Self {
        let die = rng.range_inclusive(1, i64::from(sides.max(1))) as i32;
        Self { die, bonus }
    }

    /// The value compared against the accuracy thresholds.
    pub fn total(&self) -> i32 {
        self.die.saturating_add(self.bonus)
    }
}

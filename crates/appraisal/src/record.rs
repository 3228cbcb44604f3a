use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hoard_core::{AppraisalId, CharacterId, LootId};
use hoard_valuation::ComparisonKey;

/// One character's believed value for one loot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub id: AppraisalId,
    pub loot_id: LootId,
    pub character_id: CharacterId,
    /// Total roll (die + bonus). `None` when the belief was copied from a
    /// prior appraisal of an identical item.
    pub roll: Option<i32>,
    pub believed_value: f64,
    pub appraised_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appraisal {
    pub fn new(
        loot_id: LootId,
        character_id: CharacterId,
        roll: Option<i32>,
        believed_value: f64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AppraisalId::new(),
            loot_id,
            character_id,
            roll,
            believed_value,
            appraised_at: at,
            updated_at: at,
        }
    }
}

/// A character's earlier appraisal, joined with the appraised item's key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAppraisal {
    pub key: ComparisonKey,
    pub believed_value: f64,
}

/// Aggregate view of the appraisals on one loot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalSummary {
    pub count: usize,
    /// Mean believed value rounded to 2 decimals; `None` without appraisals.
    pub average_believed_value: Option<f64>,
}

impl AppraisalSummary {
    pub fn from_appraisals(appraisals: &[Appraisal]) -> Self {
        let count = appraisals.len();
        let average_believed_value = (count > 0).then(|| {
            let total: f64 = appraisals.iter().map(|a| a.believed_value).sum();
            (total / count as f64 * 100.0).round() / 100.0
        });
        Self {
            count,
            average_believed_value,
        }
    }
}

use thiserror::Error;

use hoard_core::{AppraisalId, CharacterId, DomainError, LootId};

/// Storage-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("lock poisoned")]
    Poisoned,

    #[error("loot {0} not found")]
    MissingLoot(LootId),

    #[error("appraisal {0} not found")]
    MissingAppraisal(AppraisalId),

    #[error("character {character} already has an appraisal for loot {loot}")]
    Duplicate { loot: LootId, character: CharacterId },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AppraisalError {
    #[error("invalid roll: {0}")]
    InvalidRoll(String),

    #[error("true value must be a finite number, got {0}")]
    InvalidTrueValue(f64),

    #[error("believed value is not finite for true value {0}")]
    NonFiniteBelief(f64),

    #[error("character has already appraised this item")]
    AlreadyAppraised,

    #[error("loot item not found")]
    LootNotFound,

    #[error("item has no value to appraise")]
    NoValue,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

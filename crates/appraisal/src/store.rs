//! Persistence seam for loot values and appraisal records.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use hoard_core::{AppraisalId, CharacterId, LootId};
use hoard_valuation::LootInstance;

use crate::error::StoreError;
use crate::record::{Appraisal, PriorAppraisal};

/// Storage for loot instances and their appraisals.
///
/// Implementations must be safe to share across threads. Per-instance
/// serialization is the caller's job (see [`crate::locks::InstanceLocks`]).
pub trait AppraisalStore: Send + Sync {
    fn loot(&self, loot_id: LootId) -> Result<LootInstance, StoreError>;

    /// Overwrite the true value, returning the previous one.
    fn set_loot_value(
        &self,
        loot_id: LootId,
        value: Option<f64>,
    ) -> Result<Option<f64>, StoreError>;

    fn appraisals_for_loot(&self, loot_id: LootId) -> Result<Vec<Appraisal>, StoreError>;

    fn appraisal_for(
        &self,
        loot_id: LootId,
        character_id: CharacterId,
    ) -> Result<Option<Appraisal>, StoreError>;

    /// Every appraisal the character has made, joined with the appraised
    /// instance's comparison key, oldest first.
    fn prior_appraisals(&self, character_id: CharacterId)
    -> Result<Vec<PriorAppraisal>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the pair already has one.
    fn insert_appraisal(&self, appraisal: Appraisal) -> Result<(), StoreError>;

    fn update_believed_value(
        &self,
        appraisal_id: AppraisalId,
        believed_value: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

impl<S: AppraisalStore + ?Sized> AppraisalStore for Arc<S> {
    fn loot(&self, loot_id: LootId) -> Result<LootInstance, StoreError> {
        (**self).loot(loot_id)
    }

    fn set_loot_value(
        &self,
        loot_id: LootId,
        value: Option<f64>,
    ) -> Result<Option<f64>, StoreError> {
        (**self).set_loot_value(loot_id, value)
    }

    fn appraisals_for_loot(&self, loot_id: LootId) -> Result<Vec<Appraisal>, StoreError> {
        (**self).appraisals_for_loot(loot_id)
    }

    fn appraisal_for(
        &self,
        loot_id: LootId,
        character_id: CharacterId,
    ) -> Result<Option<Appraisal>, StoreError> {
        (**self).appraisal_for(loot_id, character_id)
    }

    fn prior_appraisals(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<PriorAppraisal>, StoreError> {
        (**self).prior_appraisals(character_id)
    }

    fn insert_appraisal(&self, appraisal: Appraisal) -> Result<(), StoreError> {
        (**self).insert_appraisal(appraisal)
    }

    fn update_believed_value(
        &self,
        appraisal_id: AppraisalId,
        believed_value: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).update_believed_value(appraisal_id, believed_value, at)
    }
}

/// In-memory store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAppraisalStore {
    loot: RwLock<HashMap<LootId, LootInstance>>,
    appraisals: RwLock<HashMap<AppraisalId, Appraisal>>,
}

impl InMemoryAppraisalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a loot instance.
    pub fn insert_loot(&self, loot: LootInstance) -> Result<(), StoreError> {
        let mut map = self.loot.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(loot.id, loot);
        Ok(())
    }

    pub fn appraisal(&self, appraisal_id: AppraisalId) -> Result<Appraisal, StoreError> {
        let map = self.appraisals.read().map_err(|_| StoreError::Poisoned)?;
        map.get(&appraisal_id)
            .cloned()
            .ok_or(StoreError::MissingAppraisal(appraisal_id))
    }
}

impl AppraisalStore for InMemoryAppraisalStore {
    fn loot(&self, loot_id: LootId) -> Result<LootInstance, StoreError> {
        let map = self.loot.read().map_err(|_| StoreError::Poisoned)?;
        map.get(&loot_id)
            .cloned()
            .ok_or(StoreError::MissingLoot(loot_id))
    }

    fn set_loot_value(
        &self,
        loot_id: LootId,
        value: Option<f64>,
    ) -> Result<Option<f64>, StoreError> {
        let mut map = self.loot.write().map_err(|_| StoreError::Poisoned)?;
        let loot = map.get_mut(&loot_id).ok_or(StoreError::MissingLoot(loot_id))?;
        Ok(std::mem::replace(&mut loot.value, value))
    }

    fn appraisals_for_loot(&self, loot_id: LootId) -> Result<Vec<Appraisal>, StoreError> {
        let map = self.appraisals.read().map_err(|_| StoreError::Poisoned)?;
        let mut found: Vec<Appraisal> = map
            .values()
            .filter(|a| a.loot_id == loot_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.appraised_at, a.id));
        Ok(found)
    }

    fn appraisal_for(
        &self,
        loot_id: LootId,
        character_id: CharacterId,
    ) -> Result<Option<Appraisal>, StoreError> {
        let map = self.appraisals.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .values()
            .find(|a| a.loot_id == loot_id && a.character_id == character_id)
            .cloned())
    }

    fn prior_appraisals(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<PriorAppraisal>, StoreError> {
        let appraisals = self.appraisals.read().map_err(|_| StoreError::Poisoned)?;
        let loot = self.loot.read().map_err(|_| StoreError::Poisoned)?;

        let mut mine: Vec<&Appraisal> = appraisals
            .values()
            .filter(|a| a.character_id == character_id)
            .collect();
        mine.sort_by_key(|a| (a.appraised_at, a.id));

        // Appraisals of instances that no longer exist cannot be matched.
        Ok(mine
            .into_iter()
            .filter_map(|a| {
                loot.get(&a.loot_id).map(|l| PriorAppraisal {
                    key: l.comparison_key(),
                    believed_value: a.believed_value,
                })
            })
            .collect())
    }

    fn insert_appraisal(&self, appraisal: Appraisal) -> Result<(), StoreError> {
        let mut map = self.appraisals.write().map_err(|_| StoreError::Poisoned)?;
        let taken = map
            .values()
            .any(|a| a.loot_id == appraisal.loot_id && a.character_id == appraisal.character_id);
        if taken {
            return Err(StoreError::Duplicate {
                loot: appraisal.loot_id,
                character: appraisal.character_id,
            });
        }
        map.insert(appraisal.id, appraisal);
        Ok(())
    }

    fn update_believed_value(
        &self,
        appraisal_id: AppraisalId,
        believed_value: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut map = self.appraisals.write().map_err(|_| StoreError::Poisoned)?;
        let appraisal = map
            .get_mut(&appraisal_id)
            .ok_or(StoreError::MissingAppraisal(appraisal_id))?;
        appraisal.believed_value = believed_value;
        appraisal.updated_at = at;
        Ok(())
    }
}

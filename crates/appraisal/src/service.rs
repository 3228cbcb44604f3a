//! Appraisal service: the maintainer wired to a store.
//!
//! Every operation touching one loot instance runs under that instance's
//! lock, so a recompute pass never interleaves with another recompute or a
//! new appraisal of the same item. Reuse lookups are snapshot reads.

use chrono::Utc;
use tracing::{debug, info, warn};

use hoard_core::{CharacterId, DomainError, LootId};

use crate::config::AppraisalConfig;
use crate::error::{AppraisalError, StoreError};
use crate::locks::InstanceLocks;
use crate::maintainer::{RecomputeOutcome, RollSpec, decide, recompute};
use crate::record::{Appraisal, AppraisalSummary};
use crate::rng::RandomSource;
use crate::store::AppraisalStore;

/// One appraisal to make. `die` is a hand-entered result; rolled when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppraisalRequest {
    pub loot_id: LootId,
    pub die: Option<i32>,
}

impl AppraisalRequest {
    pub fn rolled(loot_id: LootId) -> Self {
        Self { loot_id, die: None }
    }

    pub fn manual(loot_id: LootId, die: i32) -> Self {
        Self {
            loot_id,
            die: Some(die),
        }
    }
}

impl From<LootId> for AppraisalRequest {
    fn from(loot_id: LootId) -> Self {
        Self::rolled(loot_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemError {
    pub loot_id: LootId,
    pub error: AppraisalError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchAppraisal {
    pub appraisals: Vec<Appraisal>,
    pub errors: Vec<ItemError>,
}

impl BatchAppraisal {
    pub fn successful(&self) -> usize {
        self.appraisals.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn total(&self) -> usize {
        self.successful() + self.failed()
    }
}

/// Result of changing one instance's true value.
#[derive(Debug, Clone, PartialEq)]
pub struct RevalueReport {
    pub loot_id: LootId,
    pub previous_value: Option<f64>,
    pub new_value: f64,
    pub outcomes: Vec<RecomputeOutcome>,
}

impl RevalueReport {
    pub fn recomputed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.recomputed()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRevalue {
    pub reports: Vec<RevalueReport>,
    pub errors: Vec<ItemError>,
}

pub struct AppraisalService<S, R = Box<dyn RandomSource>> {
    store: S,
    rng: R,
    config: AppraisalConfig,
    locks: InstanceLocks,
}

impl<S: AppraisalStore> AppraisalService<S> {
    /// Service using the random source the configuration calls for.
    pub fn from_config(store: S, config: AppraisalConfig) -> Self {
        let rng = config.random_source();
        Self::new(store, rng, config)
    }
}

impl<S: AppraisalStore, R: RandomSource> AppraisalService<S, R> {
    pub fn new(store: S, rng: R, config: AppraisalConfig) -> Self {
        Self {
            store,
            rng,
            config,
            locks: InstanceLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AppraisalConfig {
        &self.config
    }

    /// Appraise one instance for a character.
    ///
    /// Copies the believed value of an identical item the character already
    /// appraised; otherwise rolls and generates a fresh belief.
    pub fn appraise(
        &self,
        character_id: CharacterId,
        bonus: i32,
        request: AppraisalRequest,
    ) -> Result<Appraisal, AppraisalError> {
        let _guard = self.locks.acquire(request.loot_id)?;

        let loot = self.store.loot(request.loot_id).map_err(loot_error)?;
        if self.store.appraisal_for(loot.id, character_id)?.is_some() {
            return Err(AppraisalError::AlreadyAppraised);
        }

        let priors = self.store.prior_appraisals(character_id)?;
        let roll = RollSpec {
            bonus,
            sides: self.config.die_sides,
            manual_die: request.die,
        };
        let decision = decide(
            &loot.comparison_key(),
            &priors,
            self.config.reuse_epsilon,
            roll,
            &self.rng,
        )?;

        let appraisal = Appraisal::new(
            loot.id,
            character_id,
            decision.recorded_roll(),
            decision.believed_value(),
            Utc::now(),
        );
        self.store
            .insert_appraisal(appraisal.clone())
            .map_err(|err| match err {
                StoreError::Duplicate { .. } => AppraisalError::AlreadyAppraised,
                other => other.into(),
            })?;

        debug!(
            loot = %loot.id,
            character = %character_id,
            roll = ?appraisal.roll,
            believed_value = appraisal.believed_value,
            "appraisal recorded"
        );
        Ok(appraisal)
    }

    /// Appraise several instances for one character, collecting per-item
    /// failures. Later items can reuse beliefs recorded earlier in the batch.
    pub fn appraise_all<I>(&self, character_id: CharacterId, bonus: i32, requests: I) -> BatchAppraisal
    where
        I: IntoIterator,
        I::Item: Into<AppraisalRequest>,
    {
        let mut batch = BatchAppraisal::default();
        for request in requests {
            let request = request.into();
            match self.appraise(character_id, bonus, request) {
                Ok(appraisal) => batch.appraisals.push(appraisal),
                Err(error) => batch.errors.push(ItemError {
                    loot_id: request.loot_id,
                    error,
                }),
            }
        }

        info!(
            character = %character_id,
            successful = batch.successful(),
            failed = batch.failed(),
            total = batch.total(),
            "batch appraisal finished"
        );
        batch
    }

    /// Store a new true value and recompute every appraisal of the instance.
    ///
    /// An unchanged value leaves every belief as it is.
    ///
    /// Each recomputed belief is persisted on its own; a failed write is
    /// reported in that record's outcome and leaves the others untouched.
    pub fn revalue(&self, loot_id: LootId, new_value: f64) -> Result<RevalueReport, AppraisalError> {
        if !new_value.is_finite() || new_value < 0.0 {
            return Err(DomainError::validation(format!(
                "true value must be a non-negative number, got {new_value}"
            ))
            .into());
        }

        let _guard = self.locks.acquire(loot_id)?;

        let previous_value = self
            .store
            .set_loot_value(loot_id, Some(new_value))
            .map_err(loot_error)?;

        if previous_value == Some(new_value) {
            debug!(loot = %loot_id, new_value, "true value unchanged; beliefs kept");
            return Ok(RevalueReport {
                loot_id,
                previous_value,
                new_value,
                outcomes: Vec::new(),
            });
        }

        let appraisals = match self.store.appraisals_for_loot(loot_id) {
            Ok(found) => found,
            Err(err) => {
                if let Err(restore) = self.store.set_loot_value(loot_id, previous_value) {
                    warn!(loot = %loot_id, error = %restore, "failed to restore previous value");
                }
                return Err(err.into());
            }
        };

        let now = Utc::now();
        let outcomes: Vec<RecomputeOutcome> = recompute(new_value, &appraisals, &self.rng, now)
            .into_iter()
            .zip(&appraisals)
            .map(|(outcome, original)| self.persist(outcome, original))
            .collect();

        let report = RevalueReport {
            loot_id,
            previous_value,
            new_value,
            outcomes,
        };
        info!(
            loot = %loot_id,
            previous_value = ?report.previous_value,
            new_value,
            recomputed = report.recomputed(),
            failed = report.failed(),
            "appraisals recomputed"
        );
        Ok(report)
    }

    /// Apply several value changes independently.
    pub fn revalue_many<I>(&self, updates: I) -> BatchRevalue
    where
        I: IntoIterator<Item = (LootId, f64)>,
    {
        let mut batch = BatchRevalue::default();
        for (loot_id, new_value) in updates {
            match self.revalue(loot_id, new_value) {
                Ok(report) => batch.reports.push(report),
                Err(error) => {
                    warn!(loot = %loot_id, %error, "revalue failed");
                    batch.errors.push(ItemError { loot_id, error });
                }
            }
        }
        batch
    }

    pub fn summary(&self, loot_id: LootId) -> Result<AppraisalSummary, AppraisalError> {
        self.store.loot(loot_id).map_err(loot_error)?;
        let appraisals = self.store.appraisals_for_loot(loot_id)?;
        Ok(AppraisalSummary::from_appraisals(&appraisals))
    }

    fn persist(&self, outcome: RecomputeOutcome, original: &Appraisal) -> RecomputeOutcome {
        if let Err(err) = &outcome.result {
            warn!(appraisal = %original.id, error = %err, "belief recompute failed");
            return outcome;
        }

        let updated = &outcome.appraisal;
        match self
            .store
            .update_believed_value(updated.id, updated.believed_value, updated.updated_at)
        {
            Ok(()) => outcome,
            Err(err) => {
                warn!(appraisal = %original.id, error = %err, "failed to persist recomputed belief");
                RecomputeOutcome {
                    appraisal: original.clone(),
                    result: Err(err.into()),
                }
            }
        }
    }
}

fn loot_error(err: StoreError) -> AppraisalError {
    match err {
        StoreError::MissingLoot(_) => AppraisalError::LootNotFound,
        other => AppraisalError::Store(other),
    }
}

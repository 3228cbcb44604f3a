//! Appraisal: subjective, deliberately noisy "believed value" estimates.
//!
//! - [`belief`] turns a true value and a skill roll into a believed value.
//! - [`maintainer`] decides new appraisals (with reuse of prior identical
//!   appraisals) and recomputes existing ones when a true value changes.
//!   It is pure: persistence is left to the caller.
//! - [`service`] wires the maintainer to an [`store::AppraisalStore`],
//!   serializing work per loot instance.

pub mod belief;
pub mod config;
pub mod error;
pub mod locks;
pub mod maintainer;
pub mod record;
pub mod rng;
pub mod roll;
pub mod rounding;
pub mod service;
pub mod store;

pub use belief::{AccuracyBand, RawBelief, believe};
pub use config::AppraisalConfig;
pub use error::{AppraisalError, StoreError};
pub use maintainer::{AppraisalDecision, RecomputeOutcome, RollSpec, decide, find_reusable, recompute};
pub use record::{Appraisal, AppraisalSummary, PriorAppraisal};
pub use rng::{RandomSource, SeededRandom, ThreadRandom};
pub use roll::SkillRoll;
pub use service::{AppraisalRequest, AppraisalService, BatchAppraisal, BatchRevalue, ItemError, RevalueReport};
pub use store::{AppraisalStore, InMemoryAppraisalStore};

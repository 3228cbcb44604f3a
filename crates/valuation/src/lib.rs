//! Item valuation (pure, deterministic).
//!
//! This crate prices a loot instance from its catalog base value plus the
//! modifications applied to it. No IO, no randomness: identical inputs always
//! produce identical values.

pub mod catalog;
pub mod engine;
pub mod expr;
pub mod loot;
pub mod size;

pub use catalog::{CatalogItem, Category, Modification};
pub use engine::{ModWarning, Valuation, ValuationInput, valuate, value};
pub use expr::{ExprError, Transform, apply_transform};
pub use loot::{ComparisonKey, LootInstance};
pub use size::Size;

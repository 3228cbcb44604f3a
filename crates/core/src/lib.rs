//! Shared building blocks for the treasure domain: identifiers, the domain
//! error and lenient numeric parsing. No infrastructure concerns.

pub mod error;
pub mod id;
pub mod numeric;

pub use error::DomainError;
pub use id::{AppraisalId, CatalogItemId, CharacterId, LootId, ModificationId};

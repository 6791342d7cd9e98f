//! Record model shared by every owner-scoped collection.
//!
//! # Responsibility
//! - Define the canonical stored record and its identities.
//! - Declare the per-collection field sets (brand, persona, competitor).
//!
//! # Invariants
//! - Every record is identified by a stable `StorageId` and owned by exactly
//!   one `OwnerId` for its whole lifetime.
//! - Collection descriptors configure the store; they never alter its rules.

pub mod brand;
pub mod collection;
pub mod competitor;
pub mod persona;
pub mod record;
pub mod value;

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the sequence allocator and record store contracts.
//! - Isolate SQLite query details from the authorization layer.
//!
//! # Invariants
//! - Repository writes call `RecordFields::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to storage errors.

pub mod error;
pub mod record_repo;
pub mod sequence;

//! Use-case layer in front of the record stores.
//!
//! # Responsibility
//! - Enforce ownership policy before any store access by a principal.
//! - Keep transport/auth layers decoupled from storage details.

pub mod guard;

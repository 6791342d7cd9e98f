//! Core domain logic for brandbook.
//!
//! Owner-scoped storage for brand statements, target personas and
//! competitor profiles: per-owner sequence allocation, atomic upsert by
//! `(owner, sequence_id)`, and ownership checks in front of every read,
//! merge and delete.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, StoreOptions};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::brand::{Brand, BrandFields};
pub use model::collection::{Collection, RecordFields, RecordValidationError, SequencedCollection};
pub use model::competitor::{Competitor, CompetitorFields};
pub use model::persona::{Persona, PersonaFields};
pub use model::record::{OwnerId, Record, SequenceId, StorageId};
pub use model::value::StructuredValue;
pub use repo::error::{ErrorKind, RepoError, RepoResult};
pub use repo::record_repo::{
    CancelHandle, RecordIter, RecordStore, SequencedRecordStore, SqliteRecordStore,
};
pub use repo::sequence::{SequenceAllocator, SqliteSequenceAllocator};
pub use service::guard::{check_ownership, GuardedStore, Principal};

/// Brand store over a borrowed connection.
pub type BrandStore<'conn> = SqliteRecordStore<'conn, Brand>;
/// Persona store over a borrowed connection.
pub type PersonaStore<'conn> = SqliteRecordStore<'conn, Persona>;
/// Competitor store over a borrowed connection.
pub type CompetitorStore<'conn> = SqliteRecordStore<'conn, Competitor>;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

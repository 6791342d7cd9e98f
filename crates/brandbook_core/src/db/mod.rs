//! Connection bootstrap for the record store: open, configure, migrate.
//!
//! Every connection handed to a `SqliteRecordStore` or
//! `SqliteSequenceAllocator` comes from [`open_db`], [`open_db_with_options`]
//! or [`open_db_in_memory`], so the busy timeout, WAL journal and the
//! `records` / `sequence_counters` schema are in place before the first
//! allocation or write.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; a file written by a newer
//!   brandbook is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_options, StoreOptions};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a brandbook database.
///
/// Store operations never return this directly. Converting into
/// `RepoError` re-reads the SQLite result code: a busy, locked, unopenable
/// or corrupt file becomes `StorageUnavailable`, everything else stays an
/// internal `Db` error.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a pragma, migration statement or the open itself.
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of the migrations this build ships.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "brandbook database is at schema version {db_version}; this build supports up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

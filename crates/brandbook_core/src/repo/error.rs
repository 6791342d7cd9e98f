//! Store error taxonomy and SQLite error classification.
//!
//! # Invariants
//! - Storage failures are never swallowed; they surface as
//!   `StorageUnavailable`, `Interrupted` or `Db`.
//! - `NotFound` is reported before `Forbidden` for the same lookup.

use crate::db::DbError;
use crate::model::collection::RecordValidationError;
use crate::model::record::{OwnerId, StorageId};
use rusqlite::ffi;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by allocator, store and guard operations.
#[derive(Debug)]
pub enum RepoError {
    /// No record with this storage id exists in the collection.
    NotFound(StorageId),
    /// The record exists but belongs to another owner.
    Forbidden {
        storage_id: StorageId,
        principal: OwnerId,
    },
    Validation(RecordValidationError),
    /// A write would break `(owner_id, sequence_id)` uniqueness.
    Conflict(String),
    /// Storage is unreachable, locked past the busy timeout, or damaged.
    StorageUnavailable(DbError),
    /// The operation was cancelled; whether a write landed is unknown.
    Interrupted,
    /// A persisted row could not be decoded.
    InvalidData(String),
    Db(DbError),
}

/// Flat error category for transport-layer status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Conflict,
    StorageUnavailable,
    Interrupted,
    Internal,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::Interrupted => ErrorKind::Interrupted,
            Self::InvalidData(_) | Self::Db(_) => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Forbidden {
                storage_id,
                principal,
            } => write!(f, "principal {principal} does not own record {storage_id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Interrupted => write!(f, "operation interrupted; outcome unknown"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) | Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::Forbidden { .. }
            | Self::Conflict(_)
            | Self::Interrupted
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let Some(code) = value.sqlite_error().copied() else {
            return Self::Db(DbError::Sqlite(value));
        };

        match code.code {
            ErrorCode::OperationInterrupted => Self::Interrupted,
            ErrorCode::ConstraintViolation
                if matches!(
                    code.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
            {
                Self::Conflict(value.to_string())
            }
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::FileLockingProtocolFailed => {
                Self::StorageUnavailable(DbError::Sqlite(value))
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

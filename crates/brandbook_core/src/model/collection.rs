//! Collection descriptors and the field-set contract.
//!
//! # Responsibility
//! - Name each collection and declare whether it is sequenced.
//! - Define merge and creation-validation behavior for field sets.
//!
//! # Invariants
//! - `merge` only overwrites fields present in the patch; absent fields keep
//!   their prior values.
//! - `validate` is applied to the field set exactly as it will be persisted.

use crate::model::record::SequenceId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Field set stored in `Record::fields` for one collection.
pub trait RecordFields: Serialize + DeserializeOwned + Clone + Debug + 'static {
    /// Applies `patch` onto `self`. Present patch fields win.
    fn merge(&mut self, patch: Self);

    /// Checks requirements on the field set as it would be persisted
    /// (e.g. a non-empty name).
    fn validate(&self) -> Result<(), RecordValidationError>;
}

/// Type descriptor for one collection.
pub trait Collection {
    /// Stable collection key persisted alongside every record.
    const NAME: &'static str;
    /// Whether records carry an owner-scoped sequence id.
    const SEQUENCED: bool;
    type Fields: RecordFields;
}

/// Marker for collections that support upsert-by-sequence.
pub trait SequencedCollection: Collection {}

/// Payload validation failures surfaced by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    MissingRequiredField {
        collection: &'static str,
        field: &'static str,
    },
    InvalidSequenceId(SequenceId),
    /// NaN and infinities have no JSON form and could not be read back.
    NonFiniteNumber {
        collection: &'static str,
        field: &'static str,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredField { collection, field } => {
                write!(f, "{collection} requires non-empty field `{field}`")
            }
            Self::InvalidSequenceId(value) => {
                write!(f, "sequence id must be positive, got {value}")
            }
            Self::NonFiniteNumber { collection, field } => {
                write!(f, "{collection} field `{field}` contains a NaN or infinite number")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Overwrites `slot` only when the patch carries a value.
pub(crate) fn overwrite<T>(slot: &mut Option<T>, patch: Option<T>) {
    if patch.is_some() {
        *slot = patch;
    }
}

/// Fails when a required text field is absent or blank.
pub(crate) fn require_text(
    collection: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> Result<(), RecordValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(RecordValidationError::MissingRequiredField { collection, field }),
    }
}

/// Fails when a caller-supplied sequence id is not positive.
pub fn validate_sequence_id(sequence_id: SequenceId) -> Result<(), RecordValidationError> {
    if sequence_id <= 0 {
        return Err(RecordValidationError::InvalidSequenceId(sequence_id));
    }
    Ok(())
}

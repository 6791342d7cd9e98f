//! Stored record shape and identity aliases.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Engine-assigned, globally unique record identity. Never reused.
pub type StorageId = Uuid;

/// Identity of the principal that owns a record.
pub type OwnerId = Uuid;

/// Owner-scoped sequence number within one collection. Always positive.
pub type SequenceId = i64;

/// One stored record of collection field set `F`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<F> {
    pub storage_id: StorageId,
    pub owner_id: OwnerId,
    /// Present only for sequenced collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<SequenceId>,
    pub fields: F,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped on every merge.
    pub updated_at: i64,
}

impl<F> Record<F> {
    /// Returns whether `owner` is the owner of this record.
    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner_id == owner
    }
}

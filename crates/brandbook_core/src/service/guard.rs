//! Ownership authorization guard.
//!
//! # Responsibility
//! - Check the requesting principal against a record's owner before reads,
//!   merges and deletes.
//! - Derive `owner_id` from the principal for owner-scoped operations.
//!
//! # Invariants
//! - The guard holds no data of its own besides the wrapped store.
//! - Existence is checked first: absent records yield `NotFound`, records
//!   owned by someone else yield `Forbidden`.

use crate::model::collection::{Collection, SequencedCollection};
use crate::model::record::{OwnerId, Record, SequenceId, StorageId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::record_repo::{RecordIter, RecordStore, SequencedRecordStore};
use log::warn;
use std::marker::PhantomData;

/// Verified identity of the caller, supplied by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal(OwnerId);

impl Principal {
    pub fn new(id: OwnerId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> OwnerId {
        self.0
    }
}

/// Fails with `Forbidden` unless `principal` owns `record`.
pub fn check_ownership<F>(principal: Principal, record: &Record<F>) -> RepoResult<()> {
    if record.is_owned_by(principal.id()) {
        return Ok(());
    }

    warn!(
        "event=access_denied module=service storage_id={} principal={}",
        record.storage_id,
        principal.id()
    );
    Err(RepoError::Forbidden {
        storage_id: record.storage_id,
        principal: principal.id(),
    })
}

/// Store wrapper that applies [`check_ownership`] to every operation.
pub struct GuardedStore<C, S> {
    store: S,
    _collection: PhantomData<fn() -> C>,
}

impl<C: Collection, S: RecordStore<C>> GuardedStore<C, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _collection: PhantomData,
        }
    }

    /// Returns the wrapped store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Lists the principal's own records.
    pub fn list_mine(&self, principal: Principal) -> RecordIter<'_, C::Fields> {
        self.store.list_by_owner(principal.id())
    }

    pub fn get(&self, principal: Principal, id: StorageId) -> RepoResult<Record<C::Fields>> {
        let record = self.store.get_by_id(id)?;
        check_ownership(principal, &record)?;
        Ok(record)
    }

    pub fn create(
        &mut self,
        principal: Principal,
        fields: C::Fields,
    ) -> RepoResult<Record<C::Fields>> {
        self.store.create(principal.id(), fields)
    }

    pub fn delete(&mut self, principal: Principal, id: StorageId) -> RepoResult<()> {
        let record = self.store.get_by_id(id)?;
        check_ownership(principal, &record)?;
        self.store.delete(id)
    }
}

impl<C: SequencedCollection, S: SequencedRecordStore<C>> GuardedStore<C, S> {
    /// Creates or merges the principal's record with `sequence_id`.
    ///
    /// The lookup key includes the principal, so another owner's record can
    /// never be matched.
    pub fn upsert(
        &mut self,
        principal: Principal,
        sequence_id: SequenceId,
        fields: C::Fields,
    ) -> RepoResult<Record<C::Fields>> {
        self.store.upsert(principal.id(), sequence_id, fields)
    }
}

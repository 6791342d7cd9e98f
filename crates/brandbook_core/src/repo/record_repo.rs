//! Owner-scoped record store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/create/upsert/delete over the shared `records` table,
//!   one store instantiation per collection.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every query is constrained to the store's collection.
//! - Create and upsert run in `BEGIN IMMEDIATE` transactions: the write lock
//!   is held from the first read until commit, and a dropped transaction
//!   rolls back, so a write either fully applies or not at all.
//! - `(collection, owner_id, sequence_id)` uniqueness is backed by a unique
//!   index; a violation surfaces as `RepoError::Conflict`.
//! - Upsert merges; fields omitted from the patch keep their stored values.

use crate::db::StoreOptions;
use crate::model::collection::{
    validate_sequence_id, Collection, RecordFields, SequencedCollection,
};
use crate::model::record::{OwnerId, Record, SequenceId, StorageId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::sequence::{SequenceAllocator, SqliteSequenceAllocator};
use log::{error, info, warn};
use rusqlite::{params, Connection, InterruptHandle, Row, TransactionBehavior};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const RECORD_COLUMNS: &str = "row_id, storage_id, owner_id, sequence_id, fields, created_at, updated_at";

/// Lazily paged records of one owner, in creation order.
pub type RecordIter<'a, F> = Box<dyn Iterator<Item = RepoResult<Record<F>>> + 'a>;

/// Store contract shared by every collection.
pub trait RecordStore<C: Collection> {
    /// Lists all records owned by `owner`; empty when there are none.
    fn list_by_owner(&self, owner: OwnerId) -> RecordIter<'_, C::Fields>;
    fn count_by_owner(&self, owner: OwnerId) -> RepoResult<u64>;
    fn get_by_id(&self, id: StorageId) -> RepoResult<Record<C::Fields>>;
    /// Creates a record with a fresh storage id, plus an allocated sequence
    /// id for sequenced collections.
    fn create(&mut self, owner: OwnerId, fields: C::Fields) -> RepoResult<Record<C::Fields>>;
    fn delete(&mut self, id: StorageId) -> RepoResult<()>;
}

/// Upsert-by-sequence, available only for sequenced collections.
pub trait SequencedRecordStore<C: SequencedCollection>: RecordStore<C> {
    /// Atomically merges `fields` into the record keyed by
    /// `(owner, sequence_id)`, or creates it with exactly that sequence id.
    fn upsert(
        &mut self,
        owner: OwnerId,
        sequence_id: SequenceId,
        fields: C::Fields,
    ) -> RepoResult<Record<C::Fields>>;
}

/// Cancels writes of one store from another thread.
///
/// Cancellation is sticky until [`CancelHandle::reset`]: every create,
/// upsert or delete that observes it, at its start, while running, or just
/// before commit, rolls back and reports `RepoError::Interrupted`. Reads are
/// only affected while a statement is running.
#[derive(Clone)]
pub struct CancelHandle {
    requested: Arc<AtomicBool>,
    interrupt: Arc<InterruptHandle>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.interrupt.interrupt();
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Re-enables writes after a cancellation was handled.
    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// SQLite-backed store for collection `C`.
pub struct SqliteRecordStore<'conn, C: Collection> {
    conn: &'conn mut Connection,
    page_size: u32,
    cancel_requested: Arc<AtomicBool>,
    _collection: PhantomData<fn() -> C>,
}

impl<'conn, C: Collection> SqliteRecordStore<'conn, C> {
    /// Constructs a store over a migrated connection with default options.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self::with_options(conn, &StoreOptions::default())
    }

    pub fn with_options(conn: &'conn mut Connection, options: &StoreOptions) -> Self {
        Self {
            conn,
            page_size: options.list_page_size.max(1),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            _collection: PhantomData,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            requested: Arc::clone(&self.cancel_requested),
            interrupt: Arc::new(self.conn.get_interrupt_handle()),
        }
    }
}

impl<C: Collection> RecordStore<C> for SqliteRecordStore<'_, C> {
    fn list_by_owner(&self, owner: OwnerId) -> RecordIter<'_, C::Fields> {
        Box::new(OwnerRecords::<C::Fields> {
            conn: &*self.conn,
            collection: C::NAME,
            owner: owner.to_string(),
            page_size: self.page_size,
            cursor: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }

    fn count_by_owner(&self, owner: OwnerId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1 AND owner_id = ?2;",
            params![C::NAME, owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn get_by_id(&self, id: StorageId) -> RepoResult<Record<C::Fields>> {
        find_by_storage_id::<C::Fields>(&*self.conn, C::NAME, id)?
            .ok_or(RepoError::NotFound(id))
    }

    fn create(&mut self, owner: OwnerId, fields: C::Fields) -> RepoResult<Record<C::Fields>> {
        fields.validate()?;
        ensure_not_cancelled(&self.cancel_requested, C::NAME, "record_create")?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sequence_id = if C::SEQUENCED {
            Some(SqliteSequenceAllocator::new(&tx).next(owner, C::NAME)?)
        } else {
            None
        };
        let record = insert_record(&tx, C::NAME, owner, sequence_id, fields);
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                error!(
                    "event=record_create module=repo status=error collection={} error={}",
                    C::NAME,
                    err
                );
                return Err(err);
            }
        };
        ensure_not_cancelled(&self.cancel_requested, C::NAME, "record_create")?;
        tx.commit()?;

        info!(
            "event=record_create module=repo status=ok collection={} storage_id={} sequence_id={}",
            C::NAME,
            record.storage_id,
            display_sequence(record.sequence_id)
        );
        Ok(record)
    }

    fn delete(&mut self, id: StorageId) -> RepoResult<()> {
        ensure_not_cancelled(&self.cancel_requested, C::NAME, "record_delete")?;
        let changed = self.conn.execute(
            "DELETE FROM records WHERE storage_id = ?1 AND collection = ?2;",
            params![id.to_string(), C::NAME],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!(
            "event=record_delete module=repo status=ok collection={} storage_id={}",
            C::NAME,
            id
        );
        Ok(())
    }
}

impl<C: SequencedCollection> SequencedRecordStore<C> for SqliteRecordStore<'_, C> {
    fn upsert(
        &mut self,
        owner: OwnerId,
        sequence_id: SequenceId,
        fields: C::Fields,
    ) -> RepoResult<Record<C::Fields>> {
        validate_sequence_id(sequence_id)?;
        ensure_not_cancelled(&self.cancel_requested, C::NAME, "record_upsert")?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = find_by_sequence::<C::Fields>(&tx, C::NAME, owner, sequence_id)?;
        let (record, created) = match existing {
            Some(mut record) => {
                record.fields.merge(fields);
                record.fields.validate()?;
                record.updated_at = tx.query_row(
                    "UPDATE records
                     SET
                        fields = ?1,
                        updated_at = (CAST(unixepoch('subsec') * 1000 AS INTEGER))
                     WHERE storage_id = ?2
                     RETURNING updated_at;",
                    params![
                        serde_json::to_string(&record.fields)?,
                        record.storage_id.to_string()
                    ],
                    |row| row.get(0),
                )?;
                (record, false)
            }
            None => {
                fields.validate()?;
                SqliteSequenceAllocator::new(&tx).reserve_at_least(
                    owner,
                    C::NAME,
                    sequence_id,
                )?;
                let record = insert_record(&tx, C::NAME, owner, Some(sequence_id), fields)?;
                (record, true)
            }
        };
        ensure_not_cancelled(&self.cancel_requested, C::NAME, "record_upsert")?;
        tx.commit()?;

        info!(
            "event=record_upsert module=repo status=ok collection={} storage_id={} sequence_id={} created={}",
            C::NAME,
            record.storage_id,
            sequence_id,
            created
        );
        Ok(record)
    }
}

struct OwnerRecords<'conn, F> {
    conn: &'conn Connection,
    collection: &'static str,
    owner: String,
    page_size: u32,
    /// Highest `row_id` already fetched.
    cursor: i64,
    /// Decoded rows; a row that fails to decode is kept as its error.
    buffer: VecDeque<RepoResult<Record<F>>>,
    exhausted: bool,
}

impl<F: RecordFields> OwnerRecords<'_, F> {
    fn fetch_page(&mut self) -> RepoResult<()> {
        let conn = self.conn;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS}
             FROM records
             WHERE collection = ?1
               AND owner_id = ?2
               AND row_id > ?3
             ORDER BY row_id ASC
             LIMIT ?4;"
        ))?;
        let mut rows = stmt.query(params![
            self.collection,
            self.owner,
            self.cursor,
            i64::from(self.page_size)
        ])?;

        let mut fetched = 0_u32;
        while let Some(row) = rows.next()? {
            self.cursor = row.get("row_id")?;
            self.buffer.push_back(parse_record_row(row));
            fetched += 1;
        }
        if fetched < self.page_size {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<F: RecordFields> Iterator for OwnerRecords<'_, F> {
    type Item = RepoResult<Record<F>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            // Storage failures end the listing; per-row decode failures do not.
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                self.buffer.clear();
                return Some(Err(err));
            }
        }
        self.buffer.pop_front()
    }
}

/// Fails with `Interrupted` once cancellation was requested. Called inside a
/// write transaction, the dropped transaction rolls the write back.
fn ensure_not_cancelled(requested: &AtomicBool, collection: &str, event: &str) -> RepoResult<()> {
    if requested.load(Ordering::SeqCst) {
        warn!("event={event} module=repo status=cancelled collection={collection}");
        return Err(RepoError::Interrupted);
    }
    Ok(())
}

fn insert_record<F: RecordFields>(
    conn: &Connection,
    collection: &str,
    owner: OwnerId,
    sequence_id: Option<SequenceId>,
    fields: F,
) -> RepoResult<Record<F>> {
    let storage_id = Uuid::new_v4();
    let (created_at, updated_at) = conn.query_row(
        "INSERT INTO records (storage_id, collection, owner_id, sequence_id, fields)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING created_at, updated_at;",
        params![
            storage_id.to_string(),
            collection,
            owner.to_string(),
            sequence_id,
            serde_json::to_string(&fields)?,
        ],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;

    Ok(Record {
        storage_id,
        owner_id: owner,
        sequence_id,
        fields,
        created_at,
        updated_at,
    })
}

fn find_by_storage_id<F: RecordFields>(
    conn: &Connection,
    collection: &str,
    id: StorageId,
) -> RepoResult<Option<Record<F>>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {RECORD_COLUMNS}
         FROM records
         WHERE storage_id = ?1
           AND collection = ?2;"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), collection])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_record_row(row)?));
    }
    Ok(None)
}

fn find_by_sequence<F: RecordFields>(
    conn: &Connection,
    collection: &str,
    owner: OwnerId,
    sequence_id: SequenceId,
) -> RepoResult<Option<Record<F>>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {RECORD_COLUMNS}
         FROM records
         WHERE collection = ?1
           AND owner_id = ?2
           AND sequence_id = ?3;"
    ))?;
    let mut rows = stmt.query(params![collection, owner.to_string(), sequence_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_record_row(row)?));
    }
    Ok(None)
}

fn parse_record_row<F: RecordFields>(row: &Row<'_>) -> RepoResult<Record<F>> {
    let storage_text: String = row.get("storage_id")?;
    let owner_text: String = row.get("owner_id")?;
    let fields_text: String = row.get("fields")?;
    let fields = serde_json::from_str(&fields_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid fields payload for record `{storage_text}`: {err}"
        ))
    })?;

    Ok(Record {
        storage_id: parse_uuid(&storage_text, "storage_id")?,
        owner_id: parse_uuid(&owner_text, "owner_id")?,
        sequence_id: row.get("sequence_id")?,
        fields,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in records.{column}"))
    })
}

fn display_sequence(sequence_id: Option<SequenceId>) -> String {
    sequence_id.map_or_else(|| "none".to_string(), |value| value.to_string())
}

//! Durable per-owner sequence allocator.
//!
//! # Responsibility
//! - Issue the next sequence number for one `(owner, collection)` pair.
//! - Keep the counter ahead of caller-chosen ids written through upsert.
//!
//! # Invariants
//! - Each allocation is one atomic `INSERT .. ON CONFLICT DO UPDATE`
//!   statement; there is no read-then-write window.
//! - Values returned for one pair are strictly increasing.
//! - Counters live only in `sequence_counters`, never in process memory.

use crate::model::record::{OwnerId, SequenceId};
use crate::repo::error::RepoResult;
use log::{debug, error};
use rusqlite::{params, Connection};

/// Allocator contract for owner-scoped sequence numbers.
pub trait SequenceAllocator {
    /// Returns a value greater than every value previously returned for
    /// `(owner, collection)`.
    fn next(&self, owner: OwnerId, collection: &str) -> RepoResult<SequenceId>;

    /// Raises the counter to at least `floor` without issuing a value.
    fn reserve_at_least(&self, owner: OwnerId, collection: &str, floor: SequenceId)
        -> RepoResult<()>;
}

/// SQLite-backed allocator.
///
/// Accepts any connection, including an open transaction, so allocation can
/// commit or roll back together with the record write that consumes it.
pub struct SqliteSequenceAllocator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSequenceAllocator<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SequenceAllocator for SqliteSequenceAllocator<'_> {
    fn next(&self, owner: OwnerId, collection: &str) -> RepoResult<SequenceId> {
        let issued = self.conn.query_row(
            "INSERT INTO sequence_counters (owner_id, collection, last_value)
             VALUES (?1, ?2, 1)
             ON CONFLICT (owner_id, collection)
             DO UPDATE SET last_value = last_value + 1
             RETURNING last_value;",
            params![owner.to_string(), collection],
            |row| row.get::<_, SequenceId>(0),
        );

        match issued {
            Ok(value) => {
                debug!("event=sequence_next module=repo status=ok collection={collection} value={value}");
                Ok(value)
            }
            Err(err) => {
                error!("event=sequence_next module=repo status=error collection={collection} error={err}");
                Err(err.into())
            }
        }
    }

    fn reserve_at_least(
        &self,
        owner: OwnerId,
        collection: &str,
        floor: SequenceId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO sequence_counters (owner_id, collection, last_value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (owner_id, collection)
             DO UPDATE SET last_value = MAX(last_value, excluded.last_value);",
            params![owner.to_string(), collection, floor],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SequenceAllocator, SqliteSequenceAllocator};
    use crate::db::open_db_in_memory;
    use uuid::Uuid;

    #[test]
    fn allocations_start_at_one_and_increase() {
        let conn = open_db_in_memory().unwrap();
        let allocator = SqliteSequenceAllocator::new(&conn);
        let owner = Uuid::new_v4();

        assert_eq!(allocator.next(owner, "persona").unwrap(), 1);
        assert_eq!(allocator.next(owner, "persona").unwrap(), 2);
        assert_eq!(allocator.next(owner, "persona").unwrap(), 3);
    }

    #[test]
    fn counters_are_independent_per_owner_and_collection() {
        let conn = open_db_in_memory().unwrap();
        let allocator = SqliteSequenceAllocator::new(&conn);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(allocator.next(first, "persona").unwrap(), 1);
        assert_eq!(allocator.next(first, "persona").unwrap(), 2);
        assert_eq!(allocator.next(second, "persona").unwrap(), 1);
        assert_eq!(allocator.next(first, "competitor").unwrap(), 1);
    }

    #[test]
    fn reserve_never_lowers_the_counter() {
        let conn = open_db_in_memory().unwrap();
        let allocator = SqliteSequenceAllocator::new(&conn);
        let owner = Uuid::new_v4();

        allocator.reserve_at_least(owner, "persona", 7).unwrap();
        assert_eq!(allocator.next(owner, "persona").unwrap(), 8);

        allocator.reserve_at_least(owner, "persona", 3).unwrap();
        assert_eq!(allocator.next(owner, "persona").unwrap(), 9);
    }

    #[test]
    fn rolled_back_allocation_is_not_observed() {
        let mut conn = open_db_in_memory().unwrap();
        let owner = Uuid::new_v4();

        {
            let tx = conn.transaction().unwrap();
            let allocator = SqliteSequenceAllocator::new(&tx);
            assert_eq!(allocator.next(owner, "persona").unwrap(), 1);
            tx.rollback().unwrap();
        }

        let allocator = SqliteSequenceAllocator::new(&conn);
        assert_eq!(allocator.next(owner, "persona").unwrap(), 1);
    }
}

use brandbook_core::db::{open_db, open_db_with_options};
use brandbook_core::{
    ErrorKind, PersonaFields, PersonaStore, RecordStore, RepoError, SequenceAllocator,
    SequencedRecordStore, SqliteSequenceAllocator, StoreOptions,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

fn migrated_db(dir: &Path) -> PathBuf {
    let path = dir.join("failures.db");
    drop(open_db(&path).unwrap());
    path
}

fn persona(name: &str) -> PersonaFields {
    PersonaFields {
        name: Some(name.to_string()),
        ..PersonaFields::default()
    }
}

fn table_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn writes_past_busy_timeout_report_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = migrated_db(dir.path());
    let owner = Uuid::new_v4();
    let options = StoreOptions {
        busy_timeout: Duration::from_millis(100),
        ..StoreOptions::default()
    };

    let mut conn = open_db_with_options(&path, &options).unwrap();
    let blocker = open_db(&path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

    {
        let mut store = PersonaStore::with_options(&mut conn, &options);
        let err = store.create(owner, persona("Ava")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

        let err = store.upsert(owner, 1, persona("Ava")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }

    let err = SqliteSequenceAllocator::new(&conn)
        .next(owner, "persona")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

    blocker.execute_batch("ROLLBACK;").unwrap();

    let mut store = PersonaStore::with_options(&mut conn, &options);
    let created = store.create(owner, persona("Ava")).unwrap();
    assert_eq!(created.sequence_id, Some(1));
}

#[test]
fn unreachable_database_reports_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("brandbook.db");

    let err = RepoError::from(open_db(&path).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
}

#[test]
fn cancelled_write_waiting_on_lock_is_not_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = migrated_db(dir.path());
    let owner = Uuid::new_v4();

    let mut conn = open_db(&path).unwrap();
    let blocker = open_db(&path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let store = PersonaStore::new(&mut conn);
    let cancel = store.cancel_handle();

    let (mut store, outcome) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || {
            let mut store = store;
            let outcome = store.create(owner, persona("Ava"));
            (store, outcome)
        });

        std::thread::sleep(Duration::from_millis(150));
        cancel.cancel();
        blocker.execute_batch("ROLLBACK;").unwrap();

        writer.join().unwrap()
    });

    assert!(matches!(outcome, Err(RepoError::Interrupted)));

    let verify = open_db(&path).unwrap();
    assert_eq!(table_rows(&verify, "records"), 0);
    assert_eq!(table_rows(&verify, "sequence_counters"), 0);

    cancel.reset();
    let created = store.create(owner, persona("Ava")).unwrap();
    assert_eq!(created.sequence_id, Some(1));
}

#[test]
fn cancelled_store_rejects_writes_until_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = migrated_db(dir.path());
    let owner = Uuid::new_v4();

    let mut conn = open_db(&path).unwrap();
    let mut store = PersonaStore::new(&mut conn);
    let kept = store.create(owner, persona("Ava")).unwrap();

    let cancel = store.cancel_handle();
    cancel.cancel();
    assert!(cancel.is_cancelled());

    let patch = PersonaFields {
        age: Some(31),
        ..PersonaFields::default()
    };
    assert!(matches!(
        store.upsert(owner, 1, patch.clone()),
        Err(RepoError::Interrupted)
    ));
    assert!(matches!(
        store.delete(kept.storage_id),
        Err(RepoError::Interrupted)
    ));

    let loaded = store.get_by_id(kept.storage_id).unwrap();
    assert_eq!(loaded.fields.age, None);

    cancel.reset();
    let updated = store.upsert(owner, 1, patch).unwrap();
    assert_eq!(updated.storage_id, kept.storage_id);
    assert_eq!(updated.fields.age, Some(31));
}

use brandbook_core::db::migrations::latest_version;
use brandbook_core::db::{open_db, open_db_in_memory, DbError};
use brandbook_core::{ErrorKind, RepoError};
use rusqlite::{params, Connection};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "records");
    assert_table_exists(&conn, "sequence_counters");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brandbook.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "records");
}

#[test]
fn file_databases_use_wal_journal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn newer_schema_is_internal_not_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = RepoError::from(open_db(&path).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("schema version 999"));
}

#[test]
fn sequence_ids_are_unique_per_owner_and_collection() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO records (storage_id, collection, owner_id, sequence_id)
                  VALUES (?1, ?2, ?3, ?4);";

    conn.execute(insert, params!["a", "persona", "owner-1", 1]).unwrap();
    conn.execute(insert, params!["b", "persona", "owner-2", 1]).unwrap();
    conn.execute(insert, params!["c", "competitor", "owner-1", 1]).unwrap();
    conn.execute(insert, params!["d", "brand", "owner-1", None::<i64>]).unwrap();
    conn.execute(insert, params!["e", "brand", "owner-1", None::<i64>]).unwrap();

    let err = conn
        .execute(insert, params!["f", "persona", "owner-1", 1])
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

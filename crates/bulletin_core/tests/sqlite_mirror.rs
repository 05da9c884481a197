use bulletin_core::db::migrations::latest_version;
use bulletin_core::db::{open_db, open_db_in_memory, DbError};
use bulletin_core::{
    AnnouncementDraft, AnnouncementStore, DurableStorage, ManualClock, SqliteStorage,
    StorageError, StoreError, ANNOUNCEMENTS_KEY,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_items");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn sqlite_storage_upserts_and_removes_items() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::new(&conn);

    assert_eq!(storage.get_item("k").unwrap(), None);
    storage.set_item("k", "one").unwrap();
    storage.set_item("k", "two").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("two"));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    storage.remove_item("k").unwrap();
    assert_eq!(storage.get_item("k").unwrap(), None);
}

#[test]
fn announcements_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bulletin.sqlite3");
    let clock = ManualClock::new(1_700_000_000_000);

    let expected = {
        let conn = open_db(&path).unwrap();
        let mut store = AnnouncementStore::open_with_clock(SqliteStorage::new(&conn), &clock);
        store.add(AnnouncementDraft::new("Exam week", "Library open 24h")).unwrap();
        store
            .add(AnnouncementDraft::new("Welcome", "Hello").with_author("admin"))
            .unwrap();
        store.update_at(1, AnnouncementDraft::new("Exam week", "Library open until 2am")).unwrap();
        store.announcements().to_vec()
    };

    let conn = open_db(&path).unwrap();
    let store = AnnouncementStore::open_with_clock(SqliteStorage::new(&conn), &clock);
    assert_eq!(store.announcements(), expected.as_slice());
    assert_eq!(store.get(1).map(|a| a.body.as_str()), Some("Library open until 2am"));

    let raw: String = conn
        .query_row(
            "SELECT value FROM kv_items WHERE key = ?1;",
            [ANNOUNCEMENTS_KEY],
            |row| row.get(0),
        )
        .unwrap();
    assert!(raw.starts_with('['));
}

#[test]
fn sqlite_write_failure_keeps_memory_and_marks_dirty() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);
    let mut store = AnnouncementStore::open_with_clock(SqliteStorage::new(&conn), &clock);
    store.add(AnnouncementDraft::new("saved", "")).unwrap();
    assert!(!store.is_dirty());

    conn.execute_batch("DROP TABLE kv_items;").unwrap();

    let err = store.add(AnnouncementDraft::new("unsaved", "")).unwrap_err();
    assert!(
        matches!(err, StoreError::PersistenceFailed(StorageError::Db(_))),
        "unexpected error: {err}"
    );
    assert_eq!(store.len(), 2);
    assert_eq!(store.announcements()[0].title, "unsaved");
    assert!(store.is_dirty());
    assert!(store.flush().is_err());
    assert!(store.is_dirty());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

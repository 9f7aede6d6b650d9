//! SQLite-backed record store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior,
};
use lazy_static::lazy_static;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::card::{ExtractionRecord, FieldName, PersistedRow, NOT_FOUND};

use super::{RecordStore, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Table holding extracted card info.
pub const TABLE: &str = "extracted_info";

fn columns() -> String {
    FieldName::ALL.map(FieldName::column).join(", ")
}

lazy_static! {
    static ref CREATE_TABLE: String = format!(
        "CREATE TABLE IF NOT EXISTS {TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            {}
        );
        CREATE INDEX IF NOT EXISTS idx_{TABLE}_identity ON {TABLE} (name, designation);",
        FieldName::ALL.map(|f| format!("{} TEXT", f.column())).join(",\n            ")
    );

    static ref INSERT: String = format!(
        "INSERT INTO {TABLE} ({}) VALUES ({})",
        columns(),
        (1..=FieldName::ALL.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
    );

    static ref SELECT_ALL: String = format!("SELECT id, {} FROM {TABLE}", columns());

    static ref FIND_IDENTITY: String =
        format!("SELECT id FROM {TABLE} WHERE name = ?1 AND designation = ?2 LIMIT 1");

    static ref DELETE_BY_ID: String = format!("DELETE FROM {TABLE} WHERE id = ?1");
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::SystemIoFailure,
            ) => StoreError::Connection(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

fn row_to_persisted(row: &Row) -> rusqlite::Result<PersistedRow> {
    let record = ExtractionRecord::try_from_fn(|field| {
        let value: Option<String> = row.get(field.column())?;
        Ok::<_, rusqlite::Error>(value.unwrap_or_else(|| NOT_FOUND.to_string()))
    })?;

    Ok(PersistedRow {
        id: row.get("id")?,
        record,
    })
}

/// Record store over a single SQLite connection.
///
/// The connection is guarded by a mutex and every insert runs in an
/// `IMMEDIATE` transaction, so the duplicate check and the write cannot
/// interleave with another writer in this or another process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!(
                    "failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
        // Writers in other processes wait for the lock instead of failing.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;

        info!("Record store opened at {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(&CREATE_TABLE)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Connection("connection lock poisoned".to_string()))
    }
}

impl RecordStore for SqliteStore {
    fn insert(&self, record: &ExtractionRecord) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                FIND_IDENTITY.as_str(),
                params![record.name, record.designation],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            warn!(
                "Duplicate entry for {:?} / {:?} (existing id {})",
                record.name, record.designation, id
            );
            return Err(StoreError::Duplicate {
                name: record.name.clone(),
                designation: record.designation.clone(),
            });
        }

        tx.execute(&INSERT, params_from_iter(FieldName::ALL.map(|f| record.get(f))))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("Inserted record {} for {:?}", id, record.name);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<PersistedRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", *SELECT_ALL))?;
        let rows = stmt
            .query_map([], row_to_persisted)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Listed {} records", rows.len());
        Ok(rows)
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let deleted = conn.execute(&DELETE_BY_ID, params![id])?;

        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Deleted record {}", id);
        Ok(())
    }

    fn get(&self, id: i64) -> Result<Option<PersistedRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1", *SELECT_ALL),
                params![id],
                row_to_persisted,
            )
            .optional()?;
        Ok(row)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    fn record(name: &str, designation: &str) -> ExtractionRecord {
        ExtractionRecord::from_fn(|field| match field {
            FieldName::Name => name.to_string(),
            FieldName::Designation => designation.to_string(),
            FieldName::Contact => "+91 98765 43210".to_string(),
            _ => NOT_FOUND.to_string(),
        })
    }

    #[test]
    fn test_insert_and_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert(&record("Jane Doe", "Manager")).unwrap();
        let second = store.insert(&record("John Roe", "Director")).unwrap();

        let rows = store.list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, first);
        assert_eq!(rows[0].record, record("Jane Doe", "Manager"));
        assert_eq!(rows[1].id, second);
        assert!(second > first);
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&record("Jane Doe", "Manager")).unwrap();

        let mut again = record("Jane Doe", "Manager");
        again.email = "jane@acme.com".to_string();
        let err = store.insert(&again).unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.list().unwrap()[0].record.email, "NA");
    }

    #[test]
    fn test_same_name_other_designation_allowed() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&record("Jane Doe", "Manager")).unwrap();
        store.insert(&record("Jane Doe", "Director")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_delete_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert(&record("A", "X")).unwrap();
        let b = store.insert(&record("B", "Y")).unwrap();
        let c = store.insert(&record("C", "Z")).unwrap();

        store.delete_by_id(b).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(store.get(b).unwrap().is_none());
        assert_eq!(store.get(c).unwrap().unwrap().record.name, "C");
    }

    #[test]
    fn test_delete_missing_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&record("A", "X")).unwrap();

        assert_eq!(store.delete_by_id(999), Err(StoreError::NotFound(999)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cards.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&record("Jane Doe", "Manager")).unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.get(id).unwrap().unwrap().record.designation, "Manager");
    }

    #[test]
    fn test_null_columns_read_as_placeholder() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                &format!("INSERT INTO {TABLE} (name, designation) VALUES ('A', 'B')"),
                [],
            )
            .unwrap();
        }

        let row = &store.list().unwrap()[0];
        assert_eq!(row.record.name, "A");
        assert_eq!(row.record.website, "NA");
    }

    #[test]
    fn test_concurrent_duplicates_single_connection() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.insert(&record("Jane Doe", "Manager")))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(StoreError::is_duplicate));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_duplicates_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.db");
        SqliteStore::open(&path).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || {
                    let store = SqliteStore::open(&path).unwrap();
                    store.insert(&record("Jane Doe", "Manager"))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(SqliteStore::open(&path).unwrap().count().unwrap(), 1);
    }

    #[test]
    fn test_table_layout() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{TABLE}')"))
            .unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        let mut expected = vec!["id".to_string()];
        expected.extend(FieldName::ALL.map(|f| f.column().to_string()));
        assert_eq!(columns, expected);
    }
}

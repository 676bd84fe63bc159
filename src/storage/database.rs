//! SQLite connection, statement execution and transactions

use super::{SqlRow, SqlValue, StorageError};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;

/// An open SQLite database.
///
/// Owns the native handle. The handle is released by [`Database::close`] or,
/// failing that, when the value is dropped, so every exit path (including
/// `?` and panics) releases it.
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StorageError::DbCorrupted(format!(
                "Failed to open database {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Opened database {}", path.display());
        Self::configure(conn)
    }

    /// Open an existing database file without write access. Never creates the
    /// file and leaves the journal mode as it is.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            StorageError::DbCorrupted(format!(
                "Failed to open database {} read-only: {}",
                path.display(),
                e
            ))
        })?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StorageError::write_failed("PRAGMA foreign_keys=ON", e))?;

        tracing::debug!("Opened database {} read-only", path.display());
        Ok(Self { conn: Some(conn) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StorageError::DbCorrupted(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, StorageError> {
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| StorageError::write_failed("PRAGMA journal_mode=WAL", e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StorageError::write_failed("PRAGMA foreign_keys=ON", e))?;

        tracing::debug!(journal_mode = %journal_mode, "Configured connection pragmas");
        Ok(Self { conn: Some(conn) })
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the native handle. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), StorageError> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| StorageError::write_failed("<close>", e)),
            None => Ok(()),
        }
    }

    /// `false` while a transaction is open
    pub(crate) fn autocommit(&self) -> bool {
        self.conn.as_ref().is_none_or(Connection::is_autocommit)
    }

    fn handle(&self, sql: &str) -> Result<&Connection, StorageError> {
        self.conn
            .as_ref()
            .ok_or_else(|| StorageError::write_failed(sql, "database is closed"))
    }

    // ========== Execution ==========

    /// Execute parameterless SQL, possibly several `;`-separated statements
    pub fn execute(&self, sql: &str) -> Result<(), StorageError> {
        self.handle(sql)?
            .execute_batch(sql)
            .map_err(|e| StorageError::write_failed(sql, e))
    }

    /// Run a query and collect every row as tagged values
    pub fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, StorageError> {
        let fail = |e: rusqlite::Error| StorageError::write_failed(sql, e);

        let mut stmt = self.handle(sql)?.prepare(sql).map_err(fail)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(fail)?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(fail)? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(SqlValue::from_value_ref(row.get_ref(idx).map_err(fail)?));
            }
            result.push(SqlRow::new(values));
        }
        Ok(result)
    }

    /// Run a mutating statement, returning the number of affected rows
    pub fn run(&self, sql: &str, params: &[SqlValue]) -> Result<usize, StorageError> {
        let fail = |e: rusqlite::Error| StorageError::write_failed(sql, e);

        let mut stmt = self.handle(sql)?.prepare(sql).map_err(fail)?;
        stmt.execute(params_from_iter(params.iter())).map_err(fail)
    }

    // ========== Transactions ==========

    /// Run `body` inside BEGIN/COMMIT.
    ///
    /// If `body` fails the transaction is rolled back and the body's error is
    /// returned as-is; a failing ROLLBACK is only logged. Transactions do not
    /// nest: calling this from inside `body` fails without touching the open
    /// transaction.
    pub fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.handle("BEGIN TRANSACTION")?;
        if !self.autocommit() {
            return Err(StorageError::write_failed(
                "BEGIN TRANSACTION",
                "a transaction is already active on this connection",
            )
            .into());
        }

        self.execute("BEGIN TRANSACTION")?;
        match body(self) {
            Ok(value) => match self.execute("COMMIT") {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    self.rollback_quietly();
                    Err(commit_err.into())
                }
            },
            Err(err) => {
                self.rollback_quietly();
                Err(err)
            }
        }
    }

    fn rollback_quietly(&self) {
        if let Err(e) = self.execute("ROLLBACK") {
            tracing::warn!("Rollback failed: {}", e);
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close database on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE items (id TEXT PRIMARY KEY, qty INTEGER NOT NULL)")
            .unwrap();
        db
    }

    fn count_items(db: &Database) -> i64 {
        db.query("SELECT COUNT(*) FROM items", &[]).unwrap()[0]
            .integer(0)
            .unwrap()
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();

        let rows = db.query("PRAGMA journal_mode", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&SqlValue::Text("wal".to_string())));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let rows = db.query("PRAGMA foreign_keys", &[]).unwrap();
        assert_eq!(rows[0].get(0), Some(&SqlValue::Integer(1)));
    }

    #[test]
    fn test_open_failure_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nested").join("test.db");
        assert!(matches!(Database::open(path), Err(StorageError::DbCorrupted(_))));
    }

    #[test]
    fn test_read_only_sees_data_and_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = Database::open(&path).unwrap();
            db.execute("CREATE TABLE items (id TEXT PRIMARY KEY, qty INTEGER NOT NULL)")
                .unwrap();
            db.run("INSERT INTO items VALUES ('a', 1)", &[]).unwrap();
        }

        let db = Database::open_read_only(&path).unwrap();
        assert_eq!(count_items(&db), 1);
        assert!(matches!(
            db.run("INSERT INTO items VALUES ('b', 2)", &[]),
            Err(StorageError::WriteFailed { .. })
        ));
        assert!(db.execute("CREATE TABLE other (id TEXT)").is_err());
    }

    #[test]
    fn test_read_only_never_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        assert!(matches!(
            Database::open_read_only(&path),
            Err(StorageError::DbCorrupted(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_query_reads_runtime_types() {
        let db = Database::open_in_memory().unwrap();
        let rows = db
            .query("SELECT 'a', 42, 2.5, NULL, x'00ff'", &[])
            .unwrap();

        assert_eq!(
            rows[0].values(),
            &[
                SqlValue::Text("a".to_string()),
                SqlValue::Integer(42),
                SqlValue::Real(2.5),
                SqlValue::Null,
                SqlValue::Null,
            ]
        );
    }

    #[test]
    fn test_run_binds_positionally() {
        let db = scratch();
        let changed = db
            .run(
                "INSERT INTO items (id, qty) VALUES (?1, ?2)",
                &[SqlValue::from("apple"), SqlValue::from(3i64)],
            )
            .unwrap();
        assert_eq!(changed, 1);

        let rows = db
            .query("SELECT qty FROM items WHERE id = ?1", &[SqlValue::from("apple")])
            .unwrap();
        assert_eq!(rows[0].integer(0).unwrap(), 3);
    }

    #[test]
    fn test_failure_carries_sql() {
        let db = scratch();
        let sql = "INSERT INTO nowhere VALUES (1)";
        match db.run(sql, &[]) {
            Err(StorageError::WriteFailed { sql: failed, message }) => {
                assert_eq!(failed, sql);
                assert!(message.contains("nowhere"));
            }
            other => panic!("expected WriteFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_transaction_commits() {
        let db = scratch();
        let inserted: Result<usize, StorageError> = db.transaction(|tx| {
            tx.run("INSERT INTO items VALUES ('a', 1)", &[])?;
            tx.run("INSERT INTO items VALUES ('b', 2)", &[])
        });
        assert_eq!(inserted.unwrap(), 1);
        assert_eq!(count_items(&db), 2);
    }

    #[test]
    fn test_transaction_rolls_back_and_keeps_original_error() {
        let db = scratch();
        let result: Result<(), StorageError> = db.transaction(|tx| {
            tx.run("INSERT INTO items VALUES ('a', 1)", &[])?;
            Err(StorageError::NotFound("sentinel".to_string()))
        });

        assert_eq!(result, Err(StorageError::NotFound("sentinel".to_string())));
        assert_eq!(count_items(&db), 0);
    }

    #[test]
    fn test_constraint_violation_rolls_back_whole_batch() {
        let db = scratch();
        let result: Result<(), StorageError> = db.transaction(|tx| {
            tx.run("INSERT INTO items VALUES ('a', 1)", &[])?;
            tx.run("INSERT INTO items VALUES ('a', 2)", &[])?;
            Ok(())
        });

        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
        assert_eq!(count_items(&db), 0);
    }

    #[test]
    fn test_nested_transaction_rejected() {
        let db = scratch();
        let result: Result<(), StorageError> = db.transaction(|tx| {
            tx.run("INSERT INTO items VALUES ('a', 1)", &[])?;
            tx.transaction(|inner| inner.run("INSERT INTO items VALUES ('b', 2)", &[]).map(|_| ()))
        });

        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
        assert_eq!(count_items(&db), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut db = scratch();
        db.close().unwrap();
        db.close().unwrap();
        assert!(!db.is_open());
        assert!(matches!(
            db.query("SELECT 1", &[]),
            Err(StorageError::WriteFailed { .. })
        ));
    }
}

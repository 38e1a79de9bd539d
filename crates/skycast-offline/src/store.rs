//! SQLite-backed named snapshots of HTTP responses.

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use skycast_core::{HttpResponse, RusqliteErrorExt, StorageError};

/// Versioned response snapshots keyed by URL.
pub struct SnapshotStore {
    conn: Mutex<Connection>,
}

impl SnapshotStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                name TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                snapshot TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                body BLOB NOT NULL,
                cached_at INTEGER NOT NULL,
                PRIMARY KEY (snapshot, url)
            );

            CREATE INDEX IF NOT EXISTS idx_entries_url ON entries(url);
            "#,
        )
        .map_err(RusqliteErrorExt::into_storage_error)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Write `entries` into a snapshot, creating it if needed, in one transaction.
    /// Either every entry lands or none does.
    pub fn put_all(
        &self,
        snapshot: &str,
        entries: &[(String, HttpResponse)],
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let now = Utc::now().timestamp_millis();

        let tx = conn
            .transaction()
            .map_err(RusqliteErrorExt::into_storage_error)?;
        tx.execute(
            "INSERT OR IGNORE INTO snapshots (name, created_at) VALUES (?1, ?2)",
            params![snapshot, now],
        )
        .map_err(RusqliteErrorExt::into_storage_error)?;

        for (url, response) in entries {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO entries (snapshot, url, status, body, cached_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![snapshot, url, response.status, response.body, now],
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;
        }

        tx.commit().map_err(RusqliteErrorExt::into_storage_error)
    }

    /// Store a single response.
    pub fn put(
        &self,
        snapshot: &str,
        url: &str,
        response: &HttpResponse,
    ) -> Result<(), StorageError> {
        self.put_all(snapshot, &[(url.to_string(), response.clone())])
    }

    /// Look a URL up across every snapshot, newest entry first.
    pub fn match_url(&self, url: &str) -> Result<Option<HttpResponse>, StorageError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT status, body FROM entries WHERE url = ?1 ORDER BY cached_at DESC LIMIT 1",
            params![url],
            |row| Ok(HttpResponse::new(row.get::<_, u16>(0)?, row.get::<_, Vec<u8>>(1)?)),
        )
        .optional()
        .map_err(RusqliteErrorExt::into_storage_error)
    }

    /// Names of every stored snapshot.
    pub fn snapshot_names(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT name FROM snapshots ORDER BY created_at ASC, name ASC")
            .map_err(RusqliteErrorExt::into_storage_error)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(RusqliteErrorExt::into_storage_error)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(RusqliteErrorExt::into_storage_error)
    }

    pub fn entry_count(&self, snapshot: &str) -> Result<usize, StorageError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM entries WHERE snapshot = ?1",
                params![snapshot],
                |row| row.get(0),
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;
        Ok(count as usize)
    }

    /// Delete a snapshot and its entries. Returns whether it existed.
    pub fn delete_snapshot(&self, snapshot: &str) -> Result<bool, StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(RusqliteErrorExt::into_storage_error)?;

        tx.execute("DELETE FROM entries WHERE snapshot = ?1", params![snapshot])
            .map_err(RusqliteErrorExt::into_storage_error)?;
        let removed = tx
            .execute("DELETE FROM snapshots WHERE name = ?1", params![snapshot])
            .map_err(RusqliteErrorExt::into_storage_error)?;

        tx.commit().map_err(RusqliteErrorExt::into_storage_error)?;
        Ok(removed > 0)
    }
}

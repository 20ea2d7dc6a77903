use crate::store::StoreError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS harvest_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS harvest_runs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    worksheet     TEXT NOT NULL,
    mode          TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    finished_at   TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL,
    failed_pages  TEXT NOT NULL,
    scraped       INTEGER NOT NULL,
    skipped_known INTEGER NOT NULL,
    written       INTEGER NOT NULL,
    stop_reason   TEXT NOT NULL
);
"#;

/// A SQLite file with an explicit open/close lifecycle.
pub struct Database {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file (creating it if needed) and apply the base schema.
    pub fn open(&mut self) -> Result<(), StoreError> {
        if self.conn.is_none() {
            let conn = Connection::open(&self.path)?;
            conn.execute_batch(SCHEMA)?;
            self.conn = Some(conn);
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Db(e))?;
        }
        Ok(())
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.as_mut().ok_or(StoreError::NotOpen)?;
        f(conn)
    }
}

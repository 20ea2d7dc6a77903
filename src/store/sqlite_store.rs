// sqlite_store.rs
use crate::config::SyncMode;
use crate::db::connection::Database;
use crate::db::listings::{
    clear_worksheet, create_worksheet, get_permalinks, get_records, insert_records,
    is_valid_worksheet,
};
use crate::db::meta::claim_sync_mode;
use crate::db::runs::{get_recent_runs, insert_run, HarvestRun};
use crate::pipeline::RunReport;
use crate::scraper::models::EnrichedRecord;
use crate::store::{RecordStore, StoreError};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Tabular store: the database file is the spreadsheet, `worksheet` a table in it.
pub struct SqliteStore {
    db: Database,
    worksheet: String,
    fields: Vec<String>,
}

impl SqliteStore {
    pub fn new(
        path: impl Into<PathBuf>,
        worksheet: &str,
        fields: &[String],
    ) -> Result<Self, StoreError> {
        if !is_valid_worksheet(worksheet) {
            return Err(StoreError::Corrupt(format!(
                "`{worksheet}` is not a valid worksheet name"
            )));
        }

        Ok(Self {
            db: Database::new(path),
            worksheet: worksheet.to_string(),
            fields: fields.to_vec(),
        })
    }

    pub fn recent_runs(&mut self, limit: usize) -> Result<Vec<HarvestRun>, StoreError> {
        self.db.with_conn(|conn| get_recent_runs(conn, limit))
    }
}

impl RecordStore for SqliteStore {
    fn open(&mut self) -> Result<(), StoreError> {
        self.db.open()?;
        let worksheet = &self.worksheet;
        self.db.with_conn(|conn| create_worksheet(conn, worksheet))?;
        info!(
            "Opened worksheet `{}` in {}",
            self.worksheet,
            self.db.path().display()
        );
        Ok(())
    }

    fn read_all_keys(&mut self) -> Result<HashSet<String>, StoreError> {
        let worksheet = &self.worksheet;
        self.db.with_conn(|conn| get_permalinks(conn, worksheet))
    }

    fn append_rows(&mut self, rows: &[EnrichedRecord]) -> Result<(), StoreError> {
        let worksheet = &self.worksheet;
        self.db.with_conn(|conn| insert_records(conn, worksheet, rows))?;
        info!("Appended {} rows to `{}`", rows.len(), self.worksheet);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let worksheet = &self.worksheet;
        self.db.with_conn(|conn| clear_worksheet(conn, worksheet))
    }

    fn read_all_rows(&mut self) -> Result<Vec<EnrichedRecord>, StoreError> {
        let worksheet = &self.worksheet;
        let fields = &self.fields;
        self.db.with_conn(|conn| get_records(conn, worksheet, fields))
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.db.close()
    }

    fn claim_mode(&mut self, mode: SyncMode) -> Result<(), StoreError> {
        let worksheet = &self.worksheet;
        self.db.with_conn(|conn| claim_sync_mode(conn, worksheet, mode))
    }

    fn record_run(&mut self, report: &RunReport) -> Result<(), StoreError> {
        let worksheet = &self.worksheet;
        self.db
            .with_conn(|conn| insert_run(conn, worksheet, report))
            .map(|_| ())
    }
}

mod csv_store;
mod lock;
mod reconcile;
mod sqlite_store;
mod store_error;

pub use csv_store::CsvStore;
pub use lock::RunLock;
pub use reconcile::{dedupe, reconcile};
pub use sqlite_store::SqliteStore;
pub use store_error::StoreError;

use crate::config::SyncMode;
use crate::pipeline::RunReport;
use crate::scraper::models::EnrichedRecord;
use std::collections::HashSet;

/// Keyed, append-only record collection. The pipeline treats it as the
/// authority on which permalinks are already known.
pub trait RecordStore {
    /// Connect or create. Called once before any other operation.
    fn open(&mut self) -> Result<(), StoreError>;

    /// Permalinks of every stored record.
    fn read_all_keys(&mut self) -> Result<HashSet<String>, StoreError>;

    fn append_rows(&mut self, rows: &[EnrichedRecord]) -> Result<(), StoreError>;

    /// Drop every stored record. Only used by rewrite runs.
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Every stored record in insertion order.
    fn read_all_rows(&mut self) -> Result<Vec<EnrichedRecord>, StoreError>;

    /// Flush and release. The store may be opened again afterwards.
    fn close(&mut self) -> Result<(), StoreError>;

    /// Refuse to run if the store was previously used in another sync mode.
    fn claim_mode(&mut self, _mode: SyncMode) -> Result<(), StoreError> {
        Ok(())
    }

    fn record_run(&mut self, _report: &RunReport) -> Result<(), StoreError> {
        Ok(())
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("store columns {found:?} do not match configured columns {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("store is kept in {claimed} mode, refusing a {requested} run")]
    ModeMismatch { claimed: String, requested: String },

    #[error("another run holds the lock at {}", .0.display())]
    Locked(PathBuf),

    #[error("store is not open")]
    NotOpen,

    #[error("corrupt stored row: {0}")]
    Corrupt(String),
}

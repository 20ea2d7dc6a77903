// csv_store.rs
use crate::scraper::models::{header_row, EnrichedRecord, LINK_COLUMN};
use crate::store::{RecordStore, StoreError};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use tracing::info;

/// Flat delimited file with a fixed header row.
pub struct CsvStore {
    path: PathBuf,
    fields: Vec<String>,
    header: Vec<String>,
    is_open: bool,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>, fields: &[String]) -> Self {
        Self {
            path: path.into(),
            fields: fields.to_vec(),
            header: header_row(fields),
            is_open: false,
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_open {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }

    fn write_header(&self) -> Result<(), StoreError> {
        let file = File::create(&self.path)?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        w.write_record(&self.header)?;
        w.flush()?;
        Ok(())
    }

    fn reader(&self) -> Result<csv::Reader<File>, StoreError> {
        Ok(csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?)
    }
}

impl RecordStore for CsvStore {
    fn open(&mut self) -> Result<(), StoreError> {
        let size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        if size == 0 {
            info!("Creating {}", self.path.display());
            self.write_header()?;
        } else {
            let found: Vec<String> = self.reader()?.headers()?.iter().map(String::from).collect();
            if found != self.header {
                return Err(StoreError::SchemaMismatch {
                    expected: self.header.clone(),
                    found,
                });
            }
        }

        self.is_open = true;
        Ok(())
    }

    fn read_all_keys(&mut self) -> Result<HashSet<String>, StoreError> {
        self.ensure_open()?;

        let mut keys = HashSet::new();
        for record in self.reader()?.records() {
            let record = record?;
            if let Some(link) = record.get(LINK_COLUMN).filter(|l| !l.is_empty()) {
                keys.insert(link.to_string());
            }
        }
        Ok(keys)
    }

    fn append_rows(&mut self, rows: &[EnrichedRecord]) -> Result<(), StoreError> {
        self.ensure_open()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            w.write_record(row.to_row())?;
        }
        w.flush()?;

        info!("Appended {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.write_header()
    }

    fn read_all_rows(&mut self) -> Result<Vec<EnrichedRecord>, StoreError> {
        self.ensure_open()?;

        let mut rows = Vec::new();
        for record in self.reader()?.records() {
            let cells: Vec<String> = record?.iter().map(String::from).collect();
            let row = EnrichedRecord::from_row(&cells, &self.fields)
                .ok_or_else(|| StoreError::Corrupt(format!("row without link: {cells:?}")))?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.is_open = false;
        Ok(())
    }
}

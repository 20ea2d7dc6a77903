use crate::pipeline::RunReport;
use crate::store::StoreError;
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HarvestRun {
    pub id: i64,
    pub worksheet: String,
    pub mode: String,
    pub started_at: String,
    pub finished_at: String,
    pub pages_fetched: i64,
    pub scraped: i64,
    pub written: i64,
    pub stop_reason: String,
}

pub fn insert_run(conn: &Connection, worksheet: &str, report: &RunReport) -> Result<i64, StoreError> {
    let failed_pages =
        serde_json::to_string(&report.failed_pages).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let stop_reason =
        serde_json::to_string(&report.stop).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    conn.execute(
        r#"
        INSERT INTO harvest_runs (
            worksheet, mode, started_at, finished_at, pages_fetched, failed_pages,
            scraped, skipped_known, written, stop_reason
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            worksheet,
            report.mode.as_str(),
            report.started_at.to_rfc3339(),
            report.finished_at.to_rfc3339(),
            report.pages_fetched,
            failed_pages,
            report.scraped as i64,
            report.skipped_known as i64,
            report.written as i64,
            stop_reason,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_recent_runs(conn: &Connection, limit: usize) -> Result<Vec<HarvestRun>, StoreError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, worksheet, mode, started_at, finished_at, pages_fetched, scraped, written, stop_reason
        FROM harvest_runs
        ORDER BY id DESC
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(HarvestRun {
            id: row.get(0)?,
            worksheet: row.get(1)?,
            mode: row.get(2)?,
            started_at: row.get(3)?,
            finished_at: row.get(4)?,
            pages_fetched: row.get(5)?,
            scraped: row.get(6)?,
            written: row.get(7)?,
            stop_reason: row.get(8)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}

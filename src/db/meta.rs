use crate::config::SyncMode;
use crate::store::StoreError;
use rusqlite::{params, Connection, OptionalExtension};

/// The first run against a worksheet fixes its sync mode; later runs must match it.
pub fn claim_sync_mode(conn: &Connection, worksheet: &str, mode: SyncMode) -> Result<(), StoreError> {
    let key = format!("sync_mode:{worksheet}");

    let claimed: Option<String> = conn
        .query_row(
            "SELECT value FROM harvest_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match claimed {
        Some(claimed) if claimed != mode.as_str() => Err(StoreError::ModeMismatch {
            claimed,
            requested: mode.as_str().to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO harvest_meta (key, value) VALUES (?1, ?2)",
                params![key, mode.as_str()],
            )?;
            Ok(())
        }
    }
}

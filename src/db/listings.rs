use crate::scraper::models::{EnrichedRecord, ListingSummary};
use crate::store::StoreError;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;

/// Worksheet names end up inside SQL, so only plain identifiers are allowed.
pub fn is_valid_worksheet(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn create_worksheet(conn: &Connection, worksheet: &str) -> Result<(), StoreError> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{worksheet}" (
            permalink     TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            image_url     TEXT NOT NULL,
            place         TEXT NOT NULL,
            price         TEXT NOT NULL,
            mileage       TEXT NOT NULL,
            date_added    TEXT NOT NULL,
            details       TEXT NOT NULL,
            first_seen_at TEXT NOT NULL
        );
        "#
    ))?;
    Ok(())
}

pub fn get_permalinks(conn: &Connection, worksheet: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn.prepare(&format!(r#"SELECT permalink FROM "{worksheet}""#))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut keys = HashSet::new();
    for r in rows {
        keys.insert(r?);
    }
    Ok(keys)
}

/// All rows go in one transaction; a duplicate permalink aborts the batch.
pub fn insert_records(
    conn: &mut Connection,
    worksheet: &str,
    records: &[EnrichedRecord],
) -> Result<(), StoreError> {
    let now = Utc::now().naive_utc();
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare(&format!(
            r#"
            INSERT INTO "{worksheet}" (
                permalink, name, image_url, place, price, mileage, date_added,
                details, first_seen_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#
        ))?;

        for record in records {
            let s = &record.summary;
            let details = serde_json::to_string(&record.details)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;

            stmt.execute(params![
                s.permalink,
                s.name,
                s.image_url,
                s.place,
                s.price,
                s.mileage,
                s.date_added,
                details,
                now,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

pub fn clear_worksheet(conn: &Connection, worksheet: &str) -> Result<(), StoreError> {
    conn.execute(&format!(r#"DELETE FROM "{worksheet}""#), [])?;
    Ok(())
}

/// Stored rows in insertion order, projected onto the `fields` whitelist.
pub fn get_records(
    conn: &Connection,
    worksheet: &str,
    fields: &[String],
) -> Result<Vec<EnrichedRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT name, permalink, image_url, place, price, mileage, date_added, details
        FROM "{worksheet}"
        ORDER BY rowid
        "#
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok((
            ListingSummary {
                name: row.get(0)?,
                permalink: row.get(1)?,
                image_url: row.get(2)?,
                place: row.get(3)?,
                price: row.get(4)?,
                mileage: row.get(5)?,
                date_added: row.get(6)?,
            },
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (summary, details_json) = r?;
        let stored: Vec<(String, String)> = serde_json::from_str(&details_json)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", summary.permalink)))?;

        let details = fields
            .iter()
            .map(|f| {
                let value = stored
                    .iter()
                    .find(|(k, _)| k == f)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                (f.clone(), value)
            })
            .collect();

        out.push(EnrichedRecord { summary, details });
    }
    Ok(out)
}

use crate::scraper::models::{header_row, EnrichedRecord};
use crate::store::{RecordStore, StoreError};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

const IMAGE_COLUMN: u16 = 2;

/// Spreadsheet rendering of an image link. Only the workbook sees this form.
pub fn image_formula(url: &str) -> String {
    format!("=IMAGE(\"{}\")", url.replace('"', "\"\""))
}

pub fn export_listings_xlsx(
    records: &[EnrichedRecord],
    fields: &[String],
    path: &Path,
) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Listings")?;

    let bold = Format::new().set_bold();

    // Headers
    for (col, header) in header_row(fields).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    // Rows
    for (i, record) in records.iter().enumerate() {
        let r = (i + 1) as u32;

        for (col, value) in record.to_row().iter().enumerate() {
            let col = col as u16;
            if col == IMAGE_COLUMN && !value.is_empty() {
                worksheet.write_formula(r, col, image_formula(value).as_str())?;
            } else {
                worksheet.write_string(r, col, value)?;
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook.save(path)?;
    Ok(())
}

/// Snapshot the whole store into a workbook. Returns the row count.
pub fn export_store<S: RecordStore + ?Sized>(
    store: &mut S,
    fields: &[String],
    path: &Path,
) -> Result<usize, StoreError> {
    store.open()?;
    let records = store.read_all_rows()?;
    store.close()?;

    export_listings_xlsx(&records, fields, path)?;
    info!("Exported {} listings to {}", records.len(), path.display());
    Ok(records.len())
}

use serde::Serialize;
use std::collections::HashMap;

/// Value written when a listing shows no distance.
pub const MILEAGE_UNKNOWN: &str = "unknown";

// EnrichedRecord column layout
//  ├── Name
//  ├── Link        (identity key)
//  ├── ImageURL
//  ├── Place
//  ├── Price
//  ├── Mileage
//  ├── DateAdded
//  └── one column per whitelisted detail attribute

pub const SUMMARY_COLUMNS: [&str; 7] = [
    "Name",
    "Link",
    "ImageURL",
    "Place",
    "Price",
    "Mileage",
    "DateAdded",
];

/// Index of the permalink within a flattened row.
pub const LINK_COLUMN: usize = 1;

/// One row from a list page. Price and mileage stay display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub name: String,
    pub permalink: String,
    pub image_url: String,
    pub place: String,
    pub price: String,
    pub mileage: String,
    pub date_added: String,
}

/// Attribute table of a detail page; no fixed schema.
pub type ListingDetail = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    pub summary: ListingSummary,
    /// Whitelisted attributes in whitelist order, `""` when absent.
    pub details: Vec<(String, String)>,
}

impl EnrichedRecord {
    pub fn merge(summary: ListingSummary, detail: &ListingDetail, fields: &[String]) -> Self {
        let details = fields
            .iter()
            .map(|f| (f.clone(), detail.get(f).cloned().unwrap_or_default()))
            .collect();

        Self { summary, details }
    }

    pub fn permalink(&self) -> &str {
        &self.summary.permalink
    }

    /// Fixed-order field list matching `header_row`.
    pub fn to_row(&self) -> Vec<String> {
        let s = &self.summary;
        let mut row = vec![
            s.name.clone(),
            s.permalink.clone(),
            s.image_url.clone(),
            s.place.clone(),
            s.price.clone(),
            s.mileage.clone(),
            s.date_added.clone(),
        ];
        row.extend(self.details.iter().map(|(_, v)| v.clone()));
        row
    }

    /// Inverse of `to_row`. Short rows are padded with empty strings.
    pub fn from_row(row: &[String], fields: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();

        let permalink = cell(LINK_COLUMN);
        if permalink.is_empty() {
            return None;
        }

        let summary = ListingSummary {
            name: cell(0),
            permalink,
            image_url: cell(2),
            place: cell(3),
            price: cell(4),
            mileage: cell(5),
            date_added: cell(6),
        };

        let details = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), cell(SUMMARY_COLUMNS.len() + i)))
            .collect();

        Some(Self { summary, details })
    }
}

/// Header row for a given detail whitelist: `Fuel Type` becomes `FuelType`.
pub fn header_row(fields: &[String]) -> Vec<String> {
    SUMMARY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(fields.iter().map(|f| column_name(f)))
        .collect()
}

pub fn column_name(field: &str) -> String {
    field.split_whitespace().collect()
}

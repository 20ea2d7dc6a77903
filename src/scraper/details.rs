// details.rs
use crate::config::SiteSelectors;
use crate::scraper::listings::{compile, element_text};
use crate::scraper::models::ListingDetail;
use crate::scraper::{FetchError, PageFetcher, ParseError};
use scraper::{Html, Selector};
use tracing::warn;

/// Shapes a row of the attributes table can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRow {
    KeyValue(String, String),
    DoubleKeyValue(String, String, String, String),
    Unknown,
}

impl DetailRow {
    pub fn classify(mut cells: Vec<String>) -> Self {
        match cells.len() {
            2 => {
                let v = cells.pop().unwrap_or_default();
                let k = cells.pop().unwrap_or_default();
                DetailRow::KeyValue(k, v)
            }
            4 => {
                let mut it = cells.into_iter();
                let mut next = || it.next().unwrap_or_default();
                let (k1, v1, k2, v2) = (next(), next(), next(), next());
                DetailRow::DoubleKeyValue(k1, v1, k2, v2)
            }
            _ => DetailRow::Unknown,
        }
    }

    fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            DetailRow::KeyValue(k, v) => vec![(k, v)],
            DetailRow::DoubleKeyValue(k1, v1, k2, v2) => vec![(k1, v1), (k2, v2)],
            DetailRow::Unknown => Vec::new(),
        }
    }
}

pub struct DetailExtractor {
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl DetailExtractor {
    pub fn new(selectors: &SiteSelectors) -> Result<Self, ParseError> {
        Ok(Self {
            table: compile(&selectors.detail_table)?,
            row: compile(&selectors.detail_row)?,
            cell: compile(&selectors.detail_cell)?,
        })
    }

    /// Fetch and parse a detail page. Failures degrade to an empty mapping.
    pub fn extract_details<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        permalink: &str,
    ) -> ListingDetail {
        self.details_from(permalink, fetcher.fetch(permalink))
    }

    /// Same as `extract_details` for a body that was already fetched.
    pub fn details_from(&self, permalink: &str, body: Result<String, FetchError>) -> ListingDetail {
        match body {
            Ok(body) => self.parse_details(&body),
            Err(e) => {
                warn!("Detail page for {permalink} unavailable, continuing without it: {e}");
                ListingDetail::new()
            }
        }
    }

    /// Later duplicate keys overwrite earlier ones.
    pub fn parse_details(&self, body: &str) -> ListingDetail {
        let document = Html::parse_document(body);
        let mut detail = ListingDetail::new();

        let Some(table) = document.select(&self.table).next() else {
            return detail;
        };

        for row in table.select(&self.row) {
            let cells = row.select(&self.cell).map(element_text).collect();
            for (key, value) in DetailRow::classify(cells).into_pairs() {
                if !key.is_empty() {
                    detail.insert(key, value);
                }
            }
        }

        detail
    }
}

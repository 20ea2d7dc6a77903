// pipeline.rs
use crate::config::SyncMode;
use crate::errors::HarvestError;
use crate::notify::RunHook;
use crate::scraper::models::EnrichedRecord;
use crate::scraper::{PageFetcher, PaginationDriver, StopReason};
use crate::store::{dedupe, reconcile, RecordStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Summary of one run, printed by the binary and kept by stores with history.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: u32,
    pub failed_pages: Vec<u32>,
    pub stop: StopReason,
    /// Records the crawl produced (known listings excluded when pre-filtered).
    pub scraped: usize,
    pub skipped_known: usize,
    pub written: usize,
    /// `None` when no hook ran.
    pub notified: Option<bool>,
}

pub struct Pipeline<'a, F: PageFetcher + ?Sized, S: RecordStore> {
    driver: PaginationDriver<'a, F>,
    store: S,
    mode: SyncMode,
    skip_known_details: bool,
    hook: Option<Box<dyn RunHook + 'a>>,
}

impl<'a, F: PageFetcher + ?Sized, S: RecordStore> Pipeline<'a, F, S> {
    pub fn new(driver: PaginationDriver<'a, F>, store: S, mode: SyncMode) -> Self {
        Self {
            driver,
            store,
            mode,
            skip_known_details: true,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn RunHook + 'a>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// When on, listings already in the store never get a detail request.
    pub fn skip_known_details(mut self, on: bool) -> Self {
        self.skip_known_details = on;
        self
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// One full crawl and write. Store failures end the run; everything
    /// upstream of the store degrades instead.
    pub fn run(&mut self) -> Result<RunReport, HarvestError> {
        let started_at = Utc::now();

        self.store.open()?;
        self.store.claim_mode(self.mode)?;

        let (outcome, scraped, written) = match self.mode {
            SyncMode::Append => {
                // One snapshot per run; never re-read per row.
                let existing = self.store.read_all_keys()?;
                info!("Store already holds {} listings", existing.len());

                let no_keys = HashSet::new();
                let prefilter = if self.skip_known_details { &existing } else { &no_keys };
                let mut outcome = self.driver.run(prefilter);
                let scraped = outcome.records.len();

                let fresh = reconcile(std::mem::take(&mut outcome.records), &existing);
                (outcome, scraped, self.write(&fresh)?)
            }
            SyncMode::Rewrite => {
                let mut outcome = self.driver.run(&HashSet::new());
                let scraped = outcome.records.len();
                let rows = dedupe(std::mem::take(&mut outcome.records));

                let written = if rows.is_empty() {
                    warn!("Nothing scraped, leaving the store untouched");
                    0
                } else {
                    self.store.clear()?;
                    self.write(&rows)?
                };
                (outcome, scraped, written)
            }
        };

        let mut report = RunReport {
            mode: self.mode,
            started_at,
            finished_at: Utc::now(),
            pages_fetched: outcome.pages_fetched,
            failed_pages: outcome.failed_pages,
            stop: outcome.stop,
            scraped,
            skipped_known: outcome.skipped_known,
            written,
            notified: None,
        };

        self.store.record_run(&report)?;
        self.store.close()?;

        if written > 0 {
            if let Some(hook) = &self.hook {
                report.notified = Some(match hook.notify() {
                    Ok(()) => {
                        info!("Post-run hook notified");
                        true
                    }
                    Err(e) => {
                        warn!("Post-run hook failed: {e}");
                        false
                    }
                });
            }
        }

        info!(
            "Run finished: {} pages, {} written, stop = {:?}",
            report.pages_fetched, report.written, report.stop
        );
        Ok(report)
    }

    fn write(&mut self, rows: &[EnrichedRecord]) -> Result<usize, HarvestError> {
        if rows.is_empty() {
            info!("No new listings to store");
            return Ok(0);
        }
        self.store.append_rows(rows)?;
        Ok(rows.len())
    }
}

// paginator.rs
use crate::config::{EmptyPagePolicy, HarvestConfig};
use crate::scraper::details::DetailExtractor;
use crate::scraper::listings::ListingExtractor;
use crate::scraper::models::{EnrichedRecord, ListingSummary};
use crate::scraper::{FetchError, PageFetcher, ParseError};
use serde::Serialize;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Everything the driver needs to walk the list pages.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub base_url: Url,
    pub first_page: u32,
    pub last_page: Option<u32>,
    pub delay: Duration,
    pub empty_page_policy: EmptyPagePolicy,
    pub detail_workers: usize,
    pub stop_on_repeat: bool,
    pub fields: Vec<String>,
}

/// Terminal state of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StopReason {
    /// A page yielded no parseable listings.
    Exhausted { page: u32 },
    /// The configured last page was processed.
    MaxReached { page: u32 },
    /// A page repeated the previous page's listings exactly (opt-in).
    Repeated { page: u32 },
}

#[derive(Debug)]
pub struct CrawlOutcome {
    /// Page order, then document order within a page.
    pub records: Vec<EnrichedRecord>,
    pub pages_fetched: u32,
    pub failed_pages: Vec<u32>,
    pub skipped_known: usize,
    pub stop: StopReason,
}

pub struct PaginationDriver<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    listings: ListingExtractor,
    details: DetailExtractor,
    plan: CrawlPlan,
}

impl<'a, F: PageFetcher + ?Sized> PaginationDriver<'a, F> {
    pub fn new(
        fetcher: &'a F,
        listings: ListingExtractor,
        details: DetailExtractor,
        plan: CrawlPlan,
    ) -> Self {
        Self {
            fetcher,
            listings,
            details,
            plan,
        }
    }

    pub fn from_config(fetcher: &'a F, config: &HarvestConfig) -> Result<Self, ParseError> {
        let src = &config.source;
        let base_url = config.base_url().map_err(|e| ParseError::InvalidUrl {
            value: src.base_search_url.clone(),
            reason: e.to_string(),
        })?;

        let plan = CrawlPlan {
            base_url,
            first_page: src.first_page,
            last_page: src.last_page,
            delay: src.delay(),
            empty_page_policy: src.empty_page_policy,
            detail_workers: src.detail_workers,
            stop_on_repeat: src.stop_on_repeat,
            fields: config.details.fields.clone(),
        };

        Ok(Self::new(
            fetcher,
            ListingExtractor::new(&config.selectors, src.skip_leading)?,
            DetailExtractor::new(&config.selectors)?,
            plan,
        ))
    }

    /// Walk pages from `first_page` until a terminal state. Listings whose
    /// permalink is in `known` are counted but neither enriched nor emitted.
    pub fn run(&self, known: &HashSet<String>) -> CrawlOutcome {
        let mut page = self.plan.first_page;
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut failed_pages = Vec::new();
        let mut skipped_known = 0;
        let mut previous_page: Vec<String> = Vec::new();

        let stop = loop {
            let url = page_url(&self.plan.base_url, page);
            info!("📄 Scraping page {page}: {url}");

            pages_fetched += 1;
            let mut summaries = self.scrape_page(&url, page, &mut failed_pages);

            if summaries.is_empty() && self.plan.empty_page_policy == EmptyPagePolicy::RetryOnce {
                info!("Page {page} came back empty, retrying once");
                thread::sleep(self.plan.delay);
                summaries = self.scrape_page(&url, page, &mut failed_pages);
            }

            if summaries.is_empty() {
                info!("🏁 No listings found on page {page}, stopping");
                break StopReason::Exhausted { page };
            }

            let permalinks: Vec<String> = summaries.iter().map(|s| s.permalink.clone()).collect();
            if self.plan.stop_on_repeat && permalinks == previous_page {
                info!("🔁 Page {page} repeats the previous page, stopping");
                break StopReason::Repeated { page };
            }
            previous_page = permalinks;

            let total = summaries.len();
            let fresh: Vec<ListingSummary> = summaries
                .into_iter()
                .filter(|s| !known.contains(&s.permalink))
                .collect();
            skipped_known += total - fresh.len();

            let enriched = self.enrich(fresh);
            info!(
                "✅ Page {page} parsed ({total} listings, {} enriched)",
                enriched.len()
            );
            records.extend(enriched);

            if self.plan.last_page.is_some_and(|last| page >= last) {
                info!("Reached last configured page {page}");
                break StopReason::MaxReached { page };
            }

            page += 1;
            thread::sleep(self.plan.delay);
        };

        CrawlOutcome {
            records,
            pages_fetched,
            failed_pages,
            skipped_known,
            stop,
        }
    }

    fn scrape_page(&self, url: &Url, page: u32, failed: &mut Vec<u32>) -> Vec<ListingSummary> {
        match self.fetcher.fetch(url.as_str()) {
            Ok(body) => self.listings.summaries(&body, url),
            Err(e) => {
                warn!(url = e.url(), "⚠️ Page {page} failed: {e}");
                if failed.last() != Some(&page) {
                    failed.push(page);
                }
                Vec::new()
            }
        }
    }

    fn enrich(&self, summaries: Vec<ListingSummary>) -> Vec<EnrichedRecord> {
        let fields = &self.plan.fields;

        if self.plan.detail_workers <= 1 || summaries.len() < 2 {
            return summaries
                .into_iter()
                .map(|s| {
                    let detail = self.details.extract_details(self.fetcher, &s.permalink);
                    EnrichedRecord::merge(s, &detail, fields)
                })
                .collect();
        }

        let bodies = self.fetch_details_pooled(&summaries);
        summaries
            .into_iter()
            .zip(bodies)
            .map(|(s, body)| {
                let detail = self.details.details_from(&s.permalink, body);
                EnrichedRecord::merge(s, &detail, fields)
            })
            .collect()
    }

    /// Detail bodies fetched on at most `detail_workers` threads, returned in
    /// the order of `summaries`.
    fn fetch_details_pooled(&self, summaries: &[ListingSummary]) -> Vec<Result<String, FetchError>> {
        let chunk = summaries.len().div_ceil(self.plan.detail_workers);
        let fetcher = self.fetcher;
        debug!(
            "Fetching {} detail pages on {} workers",
            summaries.len(),
            summaries.len().div_ceil(chunk)
        );

        thread::scope(|scope| {
            let handles: Vec<_> = summaries
                .chunks(chunk)
                .map(|part| {
                    scope.spawn(move || {
                        part.iter()
                            .map(|s| fetcher.fetch(&s.permalink))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}

/// `{base}?page={n}`, or `&page={n}` when the base already has a query.
/// A `page` pair already on the base is replaced.
pub fn page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(&kept)
        .append_pair("page", &page.to_string());
    url
}

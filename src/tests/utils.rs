// src/tests/utils.rs

use crate::config::HarvestConfig;
use crate::pipeline::RunReport;
use crate::scraper::models::{EnrichedRecord, ListingSummary};
use crate::scraper::{FetchError, PageFetcher, PaginationDriver};
use crate::store::{RecordStore, StoreError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread;

pub const BASE: &str = "https://cars.test/search";

pub fn page(n: u32) -> String {
    format!("{BASE}?page={n}")
}

pub fn link(slug: &str) -> String {
    format!("https://cars.test/buy/{slug}")
}

/// Config pointing at the fixture site with no delay and no page cap.
pub fn test_config() -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.source.base_search_url = BASE.to_string();
    config.source.delay_ms = 0;
    config.source.last_page = None;
    config
}

pub fn driver<'a>(fetcher: &'a FixtureFetcher, config: &HarvestConfig) -> PaginationDriver<'a, FixtureFetcher> {
    PaginationDriver::from_config(fetcher, config).expect("fixture config is valid")
}

/* ---------------- HTML fixtures ---------------- */

/// A listing card; field names in `omit` are left out of the markup.
pub fn item(slug: &str, omit: &[&str]) -> String {
    let has = |f: &str| !omit.contains(&f);
    let mut html = String::from(r#"<li class="item round">"#);

    if has("image") {
        html.push_str(&format!(
            r#"<div class="imgbox"><a href="/buy/{slug}"><img src="//img.cars.test/{slug}.jpg" alt=""></a></div>"#
        ));
    }
    if has("title") {
        html.push_str(&format!(
            r#"<h2 class="more"><a href="/buy/{slug}" title="Toyota Aqua {slug}">Toyota Aqua {slug}</a></h2>"#
        ));
    }

    html.push_str(r#"<div class="boxtext">"#);
    if has("place") {
        html.push_str(r#"<div class="boxintxt">Colombo</div>"#);
    }
    if has("price") {
        html.push_str(r#"<div class="boxintxt b">Rs. 7,250,000</div>"#);
    }
    if has("mileage") {
        html.push_str(r#"<div class="boxintxt">85000 km</div>"#);
    }
    if has("date") {
        html.push_str(r#"<div class="boxintxt s">2024-06-01</div>"#);
    }
    html.push_str("</div></li>");
    html
}

pub fn list_page(items: &[String]) -> String {
    format!(
        r#"<html><body><div id="content"><ul>{}</ul></div></body></html>"#,
        items.concat()
    )
}

pub fn items(slugs: &[&str]) -> Vec<String> {
    slugs.iter().map(|s| item(s, &[])).collect()
}

pub fn detail_page(rows: &str) -> String {
    format!(r#"<html><body><h1>Listing</h1><table class="moret">{rows}</table></body></html>"#)
}

pub fn standard_detail() -> String {
    detail_page(
        r#"
        <tr><td><p class="moreh">Contact</p></td><td>077 123 4567</td><td>Price</td><td>Rs. 7,250,000</td></tr>
        <tr><td>Make</td><td>Toyota</td><td>Model</td><td>Aqua</td></tr>
        <tr><td>YOM</td><td>2014</td><td>Mileage (km)</td><td>85000</td></tr>
        <tr><td>Gear</td><td>Automatic</td><td>Fuel Type</td><td>Hybrid</td></tr>
        <tr><td>Details</td><td colspan="3">Well maintained, first owner</td></tr>
        "#,
    )
}

pub fn record(slug: &str) -> EnrichedRecord {
    let fields = test_config().details.fields;
    EnrichedRecord::merge(
        ListingSummary {
            name: format!("Toyota Aqua {slug}"),
            permalink: link(slug),
            image_url: format!("https://img.cars.test/{slug}.jpg"),
            place: "Colombo".to_string(),
            price: "Rs. 7,250,000".to_string(),
            mileage: "85000 km".to_string(),
            date_added: "2024-06-01".to_string(),
        },
        &HashMap::from([("Make".to_string(), "Toyota".to_string())]),
        &fields,
    )
}

/// Value of a whitelisted detail column, if the record carries it.
pub fn detail<'a>(record: &'a EnrichedRecord, name: &str) -> Option<&'a str> {
    record
        .details
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/* ---------------- Fixture fetcher ---------------- */

/// URL → queued responses. The last response for a URL repeats; unknown
/// URLs answer 404. Every request is recorded.
#[derive(Default)]
pub struct FixtureFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.push(url.into(), Ok(body.into()));
        self
    }

    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        self.push(url.clone(), Err(FetchError::Status { url, status }));
        self
    }

    /// Every listing in `slugs` gets the standard detail page.
    pub fn with_details(mut self, slugs: &[&str]) -> Self {
        for slug in slugs {
            self = self.with_page(link(slug), standard_detail());
        }
        self
    }

    fn push(&self, url: String, response: Result<String, FetchError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(response);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/* ---------------- In-memory store ---------------- */

#[derive(Default)]
pub struct MemoryStore {
    pub rows: Vec<EnrichedRecord>,
    pub key_reads: usize,
    pub clears: usize,
    pub appends: usize,
    pub is_open: bool,
    pub fail_append: bool,
    pub runs: Vec<RunReport>,
}

impl MemoryStore {
    pub fn seeded(slugs: &[&str]) -> Self {
        Self {
            rows: slugs.iter().map(|s| record(s)).collect(),
            ..Self::default()
        }
    }

    pub fn permalinks(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.permalink().to_string()).collect()
    }
}

impl RecordStore for MemoryStore {
    fn open(&mut self) -> Result<(), StoreError> {
        self.is_open = true;
        Ok(())
    }

    fn read_all_keys(&mut self) -> Result<HashSet<String>, StoreError> {
        self.key_reads += 1;
        Ok(self.permalinks().into_iter().collect())
    }

    fn append_rows(&mut self, rows: &[EnrichedRecord]) -> Result<(), StoreError> {
        if self.fail_append {
            return Err(StoreError::NotOpen);
        }
        self.appends += 1;
        self.rows.extend_from_slice(rows);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.clears += 1;
        self.rows.clear();
        Ok(())
    }

    fn read_all_rows(&mut self) -> Result<Vec<EnrichedRecord>, StoreError> {
        Ok(self.rows.clone())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.is_open = false;
        Ok(())
    }

    fn record_run(&mut self, report: &RunReport) -> Result<(), StoreError> {
        self.runs.push(report.clone());
        Ok(())
    }
}

/* ---------------- One-shot HTTP responder ---------------- */

/// Serves a single response on localhost; the raw request is sent back on
/// the returned channel.
pub fn serve_once(status_line: &'static str, body: &'static str) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind localhost");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 8192];
            let n = stream.read(&mut buf).unwrap_or(0);
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{addr}/listing"), rx)
}

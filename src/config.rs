// config.rs
use crate::db::listings::is_valid_worksheet;
use crate::scraper::fetcher::DEFAULT_USER_AGENT;
use crate::scraper::models::{column_name, SUMMARY_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Complete run configuration. Every field has a default, so an empty file
/// reproduces a plain four-page crawl into `car_listings.csv`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub source: SourceConfig,
    pub selectors: SiteSelectors,
    pub details: DetailsConfig,
    pub sink: SinkConfig,
    pub export: ExportConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Search URL including any filter path segments; `page` is appended.
    pub base_search_url: String,
    pub first_page: u32,
    /// Inclusive. `None` crawls until a page comes back empty.
    pub last_page: Option<u32>,
    /// Leading containers to drop on every page (ad cards on some views).
    pub skip_leading: usize,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub empty_page_policy: EmptyPagePolicy,
    pub detail_workers: usize,
    pub skip_known_details: bool,
    /// End the crawl when a page lists exactly the previous page's
    /// permalinks, for sites that clamp out-of-range page numbers.
    pub stop_on_repeat: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_search_url: "https://riyasewana.com/search".to_string(),
            first_page: 1,
            last_page: Some(4),
            skip_leading: 0,
            delay_ms: 1000,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            empty_page_policy: EmptyPagePolicy::Stop,
            detail_workers: 1,
            skip_known_details: true,
            stop_on_repeat: false,
        }
    }
}

impl SourceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What an empty list page means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPagePolicy {
    /// The source is exhausted.
    #[default]
    Stop,
    /// Fetch the page once more after the delay before giving up.
    RetryOnce,
}

/// Selectors describing the source markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub listing: String,
    pub title_link: String,
    pub info_cell: String,
    pub price_class: String,
    pub date_class: String,
    pub mileage_marker: String,
    pub image: String,
    pub detail_table: String,
    pub detail_row: String,
    pub detail_cell: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            listing: "li.item".to_string(),
            title_link: "a[title]".to_string(),
            info_cell: "div.boxintxt".to_string(),
            price_class: "b".to_string(),
            date_class: "s".to_string(),
            mileage_marker: "km".to_string(),
            image: "img".to_string(),
            detail_table: "table.moret".to_string(),
            detail_row: "tr".to_string(),
            detail_cell: "td".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailsConfig {
    /// Detail attributes copied into every record, in column order.
    pub fields: Vec<String>,
}

impl Default for DetailsConfig {
    fn default() -> Self {
        let fields = ["Contact", "Make", "Model", "YOM", "Gear", "Fuel Type", "Details"];
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    #[default]
    Csv,
    Sqlite,
}

/// Append diffs against stored keys; rewrite clears and writes everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    Append,
    Rewrite,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Append => "append",
            SyncMode::Rewrite => "rewrite",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub path: PathBuf,
    /// Table name inside the SQLite store.
    pub worksheet: String,
    pub mode: SyncMode,
    /// Lock file serialising runs; defaults to `<path>.lock`.
    pub lock: Option<PathBuf>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Csv,
            path: PathBuf::from("car_listings.csv"),
            worksheet: "listings".to_string(),
            mode: SyncMode::Append,
            lock: None,
        }
    }
}

impl SinkConfig {
    pub fn lock_path(&self) -> PathBuf {
        self.lock.clone().unwrap_or_else(|| {
            let mut name = self.path.clone().into_os_string();
            name.push(".lock");
            PathBuf::from(name)
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub xlsx: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Endpoint hit with a GET after rows were written.
    pub endpoint: Option<String>,
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        let src = &self.source;
        if src.first_page == 0 {
            return Err(invalid("source.first_page", "pages are numbered from 1"));
        }
        if let Some(last) = src.last_page {
            if last < src.first_page {
                return Err(invalid(
                    "source.last_page",
                    format!("{last} is before first_page {}", src.first_page),
                ));
            }
        }
        if src.detail_workers == 0 {
            return Err(invalid("source.detail_workers", "must be at least 1"));
        }
        self.validate_fields()?;
        if self.selectors.mileage_marker.trim().is_empty() {
            return Err(invalid("selectors.mileage_marker", "must not be blank"));
        }
        if !is_valid_worksheet(&self.sink.worksheet) {
            return Err(invalid(
                "sink.worksheet",
                format!("`{}` is not a plain identifier", self.sink.worksheet),
            ));
        }
        if let Some(endpoint) = &self.notify.endpoint {
            Url::parse(endpoint).map_err(|e| invalid("notify.endpoint", e.to_string()))?;
        }

        Ok(())
    }

    /// Every whitelist entry must map to its own non-empty column.
    fn validate_fields(&self) -> Result<(), ConfigError> {
        let fields = &self.details.fields;
        if fields.is_empty() {
            return Err(invalid("details.fields", "whitelist is empty"));
        }

        let mut columns = HashSet::new();
        for field in fields {
            if field.trim().is_empty() {
                return Err(invalid("details.fields", "entries must not be blank"));
            }
            let column = column_name(field);
            if SUMMARY_COLUMNS.contains(&column.as_str()) || !columns.insert(column.clone()) {
                return Err(invalid(
                    "details.fields",
                    format!("`{field}` duplicates column `{column}`"),
                ));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.source.base_search_url)
            .map_err(|e| invalid("source.base_search_url", e.to_string()))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(
                "source.base_search_url",
                format!("unsupported scheme `{other}`"),
            )),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

use crate::config::{HarvestConfig, SinkKind, SyncMode};
use crate::db::runs::HarvestRun;
use crate::errors::HarvestError;
use crate::notify::PreviewTrigger;
use crate::pipeline::{Pipeline, RunReport};
use crate::scraper::{HttpFetcher, PaginationDriver};
use crate::store::{CsvStore, RecordStore, RunLock, SqliteStore};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod config;
mod db;
mod errors;
mod notify;
mod pipeline;
mod scraper;
mod spreadsheets;
mod store;


#[derive(Parser, Debug)]
#[command(author, version, about = "Harvests new vehicle listings into a keyed store")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First list page to fetch
    #[arg(long)]
    first_page: Option<u32>,

    /// Last list page to fetch (inclusive)
    #[arg(long, conflicts_with = "all_pages")]
    last_page: Option<u32>,

    /// Keep paging until a page comes back empty
    #[arg(long, default_value_t = false)]
    all_pages: bool,

    /// append (diff against stored keys) or rewrite (clear and write all)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<SyncMode>,

    /// Store file, overriding `sink.path`
    #[arg(long)]
    sink_path: Option<PathBuf>,

    /// Export the whole store to this .xlsx after the run
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Print the last N runs recorded by a sqlite sink instead of crawling
    #[arg(long, value_name = "N")]
    history: Option<usize>,

    /// Debug-level logs for this crate
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_mode(s: &str) -> Result<SyncMode, String> {
    match s {
        "append" => Ok(SyncMode::Append),
        "rewrite" => Ok(SyncMode::Rewrite),
        other => Err(format!("unknown mode `{other}` (expected append or rewrite)")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let history_limit = args.history;
    let rendered = match history_limit {
        Some(limit) => history(&args, limit).map(|runs| serde_json::to_string_pretty(&runs)),
        None => run(args).map(|report| serde_json::to_string_pretty(&report)),
    };

    match rendered {
        Ok(json) => {
            match json {
                Ok(json) => println!("{json}"),
                Err(e) => error!("Could not render output: {e}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ Harvest failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose {
        "info,listing_harvest=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn load_config(args: &Args) -> Result<HarvestConfig, HarvestError> {
    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    };

    if let Some(first) = args.first_page {
        config.source.first_page = first;
    }
    if args.all_pages {
        config.source.last_page = None;
    } else if let Some(last) = args.last_page {
        config.source.last_page = Some(last);
    }
    if let Some(mode) = args.mode {
        config.sink.mode = mode;
    }
    if let Some(path) = &args.sink_path {
        config.sink.path = path.clone();
    }
    if let Some(path) = &args.xlsx {
        config.export.xlsx = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<RunReport, HarvestError> {
    let config = load_config(&args)?;
    let fields = &config.details.fields;

    let _lock = RunLock::acquire(config.sink.lock_path())?;
    info!(
        "Harvesting {} into {} ({} mode)",
        config.source.base_search_url,
        config.sink.path.display(),
        config.sink.mode.as_str()
    );

    match config.sink.kind {
        SinkKind::Csv => run_with_store(&config, CsvStore::new(&config.sink.path, fields)),
        SinkKind::Sqlite => {
            let store = SqliteStore::new(&config.sink.path, &config.sink.worksheet, fields)?;
            run_with_store(&config, store)
        }
    }
}

fn history(args: &Args, limit: usize) -> Result<Vec<HarvestRun>, HarvestError> {
    let config = load_config(args)?;
    if config.sink.kind != SinkKind::Sqlite {
        return Err(HarvestError::Setup(
            "run history is only kept by the sqlite sink".to_string(),
        ));
    }

    let mut store = SqliteStore::new(&config.sink.path, &config.sink.worksheet, &config.details.fields)?;
    store.open()?;
    let runs = store.recent_runs(limit)?;
    store.close()?;
    Ok(runs)
}

fn run_with_store<S: RecordStore>(config: &HarvestConfig, store: S) -> Result<RunReport, HarvestError> {
    let fetcher = HttpFetcher::new(&config.source.user_agent, config.source.timeout())
        .map_err(|e| HarvestError::Setup(e.to_string()))?;
    let driver = PaginationDriver::from_config(&fetcher, config)?;

    let mut pipeline = Pipeline::new(driver, store, config.sink.mode)
        .skip_known_details(config.source.skip_known_details);

    if let Some(endpoint) = &config.notify.endpoint {
        let hook = PreviewTrigger::new(endpoint.as_str(), config.source.timeout())
            .map_err(|e| HarvestError::Setup(e.to_string()))?;
        pipeline = pipeline.with_hook(Box::new(hook));
    }

    let report = pipeline.run()?;

    if let Some(path) = &config.export.xlsx {
        let mut store = pipeline.into_store();
        spreadsheets::export_store(&mut store, &config.details.fields, path)?;
    }

    Ok(report)
}

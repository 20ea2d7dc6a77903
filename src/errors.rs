// errors.rs
use crate::config::ConfigError;
use crate::scraper::ParseError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that end a run. Page, listing and hook failures never get here.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("setup failed: {0}")]
    Setup(String),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl From<ParseError> for HarvestError {
    fn from(e: ParseError) -> Self {
        HarvestError::Setup(e.to_string())
    }
}

pub mod details;
pub mod fetcher;
pub mod listings;
pub mod models;
pub mod paginator;
mod scraper_error;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use paginator::{PaginationDriver, StopReason};
pub use scraper_error::{FetchError, ParseError};

pub mod unixmagazin;

mod error;
mod fetch;

pub use error::ScraperError;
pub use fetch::{FetchError, Fetcher, HttpFetcher};

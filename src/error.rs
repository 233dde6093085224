use crate::fetch::FetchError;
use std::path::PathBuf;

/// Failures scoped by where they happen during a scrape. Only a listing
/// failure ends the run; the other variants are logged and contained to the
/// item they belong to.
#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("failed to retrieve listing page {url}: {source}")]
    ListingRetrieval { url: String, source: FetchError },

    #[error("failed to retrieve detail page {url}: {source}")]
    DetailRetrieval { url: String, source: FetchError },

    #[error("failed to fetch image {url}: {source}")]
    ImageFetch { url: String, source: FetchError },

    #[error("failed to write image to {}: {source}", .path.display())]
    ImageWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

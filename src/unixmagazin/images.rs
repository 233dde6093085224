use crate::error::ScraperError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_IMAGE_EXT: &str = "jpg";

/// Local image storage. Created once per run; when the backing directory
/// cannot be created the store stays disabled and records keep their remote
/// image URLs.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn create(dir: PathBuf) -> Option<ImageStore> {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(ImageStore { dir }),
            Err(err) => {
                warn!("Directory {} was not created: {}", dir.display(), err);
                None
            }
        }
    }

    pub async fn save(
        &self,
        image_url: &str,
        fallback_stem: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ScraperError> {
        let path = self.dir.join(file_name(image_url, fallback_stem));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ScraperError::ImageWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Filename for a downloaded image. Stem and extension come from the URL's
/// path component; a pathless URL falls back to `fallback_stem` and a missing
/// extension falls back to `jpg`.
fn file_name(image_url: &str, fallback_stem: &str) -> String {
    let parsed = reqwest::Url::parse(image_url).ok();
    let url_path = parsed.as_ref().map(|url| url.path()).unwrap_or_default();
    let path = Path::new(url_path);

    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(fallback_stem);
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_IMAGE_EXT);

    format!("{}.{}", stem, ext)
}

//! Saves raw fetched bodies to disk for later inspection.

use crate::error::Result;
use crate::fetcher::FetchResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

/// Creates the archive directory. Failure here is a setup error for the run.
pub async fn prepare_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Writes each page's raw body to `dir`, returning the written paths in page
/// order.
pub async fn save_pages(dir: &Path, pages: &[FetchResult]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let path = dir.join(file_name(index, &page.url));
        fs::write(&path, &page.body).await?;
        log::debug!("Saved {} to {}", page.url, path.display());
        written.push(path);
    }
    Ok(written)
}

/// `<index>-<host>[_<path>].html`, with anything unsafe in a file name
/// replaced by `_`.
fn file_name(index: usize, raw_url: &str) -> String {
    let stem = match Url::parse(raw_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("page").to_string();
            let path = url.path().trim_matches('/');
            if path.is_empty() {
                host
            } else {
                format!("{}_{}", host, path)
            }
        }
        Err(_) => raw_url.to_string(),
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    format!("{:03}-{}.html", index, sanitized)
}

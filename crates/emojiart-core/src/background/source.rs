//! URL-backed image source for native platforms.

use super::{BoxFuture, FetchError, FetchResult, ImageSource};
use std::fs;
use url::Url;

/// Reads `file://` URLs from disk and downloads `http(s)://` URLs.
///
/// Downloads use the blocking client; the future only ever runs on a
/// fetcher worker thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlImageSource;

impl UrlImageSource {
    pub fn new() -> Self {
        Self
    }
}

fn read_url(url: &Url) -> Result<Vec<u8>, FetchError> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
            Ok(fs::read(path)?)
        }
        "http" | "https" => {
            let response = reqwest::blocking::get(url.as_str())?.error_for_status()?;
            Ok(response.bytes()?.to_vec())
        }
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

impl ImageSource for UrlImageSource {
    fn fetch(&self, url: &Url) -> BoxFuture<FetchResult> {
        let url = url.clone();
        Box::pin(async move {
            match read_url(&url) {
                Ok(bytes) => FetchResult::Bytes(bytes),
                Err(e) => {
                    log::debug!("Fetch failed for {}: {}", url, e);
                    FetchResult::NotFound
                }
            }
        })
    }
}

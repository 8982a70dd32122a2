//! Background image retrieval.
//!
//! Each fetch runs on its own worker thread and reports back over a channel.
//! The owner thread drains completions and decides, by comparing URLs, whether
//! a result still belongs to the document. Nothing is cancelled: a fetch for a
//! URL that has since been replaced simply has its result dropped.

mod decode;
mod source;

pub use decode::RasterDecoder;
pub use source::UrlImageSource;

use image::RgbaImage;
use kurbo::Size;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Boxed future returned by image sources. Driven to completion on a worker thread.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Errors while retrieving or decoding a background image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Nothing found at {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Raw outcome of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Bytes(Vec<u8>),
    NotFound,
}

/// Retrieves raw image bytes for a URL.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &Url) -> BoxFuture<FetchResult>;
}

/// Turns fetched bytes into a renderable image.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<BackgroundImage, FetchError>;
}

/// A decoded background image.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pixels: Arc<RgbaImage>,
}

impl BackgroundImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Natural size in pixels.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Where the fetch for the current background URL stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    /// No background requested.
    #[default]
    Idle,
    /// Waiting for the image at this URL.
    Fetching(Url),
    /// The image at this URL is loaded.
    Resolved(Url),
    /// The last fetch failed; no image.
    Discarded,
}

/// Use the image a search-result link points at, if it embeds one as `imgurl`.
pub fn image_url(url: Url) -> Url {
    let embedded = url
        .query_pairs()
        .find(|(key, _)| key == "imgurl")
        .and_then(|(_, value)| Url::parse(&value).ok());
    embedded.unwrap_or(url)
}

/// A finished fetch, handed back to the owner thread.
#[derive(Debug)]
pub struct Completion {
    pub url: Url,
    pub outcome: Result<BackgroundImage, FetchError>,
}

/// What applying a completion did.
#[derive(Debug)]
pub enum Resolution {
    /// The image belongs to the current URL.
    Applied(BackgroundImage),
    /// The fetch for the current URL failed.
    Failed,
    /// The URL changed while fetching; result dropped.
    Stale,
}

/// Runs fetches on worker threads and tracks the fetch state.
pub struct BackgroundFetcher {
    source: Arc<dyn ImageSource>,
    decoder: Arc<dyn ImageDecoder>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    state: FetchState,
    in_flight: usize,
}

impl BackgroundFetcher {
    pub fn new(source: Arc<dyn ImageSource>, decoder: Arc<dyn ImageDecoder>) -> Self {
        let (tx, rx) = channel();
        Self {
            source,
            decoder,
            tx,
            rx,
            state: FetchState::Idle,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Number of fetches that have not been handed back yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Reset to idle and, if a URL is given, start fetching it.
    pub fn start(&mut self, url: Option<&Url>) {
        self.state = FetchState::Idle;
        let Some(url) = url else {
            return;
        };

        let source = Arc::clone(&self.source);
        let decoder = Arc::clone(&self.decoder);
        let tx = self.tx.clone();
        let worker_url = url.clone();

        let spawned = thread::Builder::new()
            .name("emojiart-fetch".to_string())
            .spawn(move || {
                let outcome = match pollster::block_on(source.fetch(&worker_url)) {
                    FetchResult::Bytes(bytes) => decoder.decode(&bytes),
                    FetchResult::NotFound => Err(FetchError::NotFound(worker_url.to_string())),
                };
                // The receiver lives as long as the fetcher; a send error means it is gone.
                let _ = tx.send(Completion {
                    url: worker_url,
                    outcome,
                });
            });

        match spawned {
            Ok(_) => {
                log::debug!("Fetching background {}", url);
                self.in_flight += 1;
                self.state = FetchState::Fetching(url.clone());
            }
            Err(e) => {
                log::warn!("Failed to start background fetch for {}: {}", url, e);
                self.state = FetchState::Discarded;
            }
        }
    }

    /// Take a finished fetch without blocking.
    pub fn try_next(&mut self) -> Option<Completion> {
        let completion = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Wait up to `timeout` for a finished fetch.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Check a completion against the document's current URL.
    ///
    /// Stale completions leave the state alone: it describes the fetch for the
    /// current URL, not the superseded one.
    pub fn resolve(&mut self, completion: Completion, current: Option<&Url>) -> Resolution {
        if current != Some(&completion.url) {
            log::debug!("Discarding stale background for {}", completion.url);
            return Resolution::Stale;
        }

        match completion.outcome {
            Ok(image) => {
                log::info!(
                    "Background resolved: {} ({}x{})",
                    completion.url,
                    image.width(),
                    image.height()
                );
                self.state = FetchState::Resolved(completion.url);
                Resolution::Applied(image)
            }
            Err(e) => {
                log::warn!("Background unavailable for {}: {}", completion.url, e);
                self.state = FetchState::Discarded;
                Resolution::Failed
            }
        }
    }
}

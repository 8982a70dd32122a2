//! EmojiArt Core Library
//!
//! Document model, persistence, background image loading and the
//! screen/document transform pipeline for the EmojiArt editor.

pub mod background;
pub mod config;
pub mod document;
pub mod drop;
pub mod emoji_art;
pub mod observer;
pub mod storage;
pub mod viewport;

pub use background::{
    BackgroundImage, FetchResult, FetchState, ImageDecoder, ImageSource, RasterDecoder,
    UrlImageSource,
};
pub use config::EditorConfig;
pub use document::EmojiArtDocument;
pub use drop::{CanvasFrame, CoordinateSpace, DropLocation, DropPayload};
pub use emoji_art::{Emoji, EmojiArt, EmojiId};
pub use observer::{ChangeEvent, SubscriptionId};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use viewport::{DragTarget, Viewport, document_to_screen, screen_to_document};

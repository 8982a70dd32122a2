//! Raster decoding with the `image` crate.

use super::{BackgroundImage, FetchError, ImageDecoder};

/// Decodes PNG, JPEG, WebP and GIF bytes into RGBA pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<BackgroundImage, FetchError> {
        let image = image::load_from_memory(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(BackgroundImage::from_rgba(image.to_rgba8()))
    }
}

//! Editor configuration.

/// Storage key the untitled document is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "EmojiArtDocument.Untitled";

/// Glyphs offered for dragging onto the canvas.
pub const DEFAULT_PALETTE: &str = "⭐️⛈🍎🌏🥨⚾️";

/// Font size given to newly dropped emoji.
pub const DEFAULT_EMOJI_SIZE: f64 = 40.0;

/// Settings shared by the document controller and its front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Key the document is stored under.
    pub storage_key: String,
    /// Palette glyphs, as one string.
    pub palette: String,
    /// Size for emoji added by a drop.
    pub default_emoji_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            palette: DEFAULT_PALETTE.to_string(),
            default_emoji_size: DEFAULT_EMOJI_SIZE,
        }
    }
}

impl EditorConfig {
    /// Split the palette into individual glyphs.
    ///
    /// Variation selectors stay attached to the glyph they follow, and
    /// zero-width joiners glue their neighbours into one glyph.
    pub fn palette_glyphs(&self) -> Vec<String> {
        let mut glyphs: Vec<String> = Vec::new();
        let mut joining = false;
        for c in self.palette.chars() {
            match glyphs.last_mut() {
                Some(last) if c == '\u{FE0F}' || c == '\u{200D}' || joining => {
                    last.push(c);
                    joining = c == '\u{200D}';
                }
                _ => glyphs.push(c.to_string()),
            }
        }
        glyphs
    }
}

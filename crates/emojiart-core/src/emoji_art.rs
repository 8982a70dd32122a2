//! The persisted EmojiArt document: a background reference and the emoji placed over it.

use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a placed emoji.
pub type EmojiId = Uuid;

/// A single emoji placed on the document.
///
/// Coordinates are offsets from the document center, not from the top-left
/// corner. Two placements are the same emoji when their ids match, whatever
/// their current position or size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    pub(crate) id: EmojiId,
    /// The glyph.
    pub text: String,
    /// Horizontal offset from the document center.
    pub x: i32,
    /// Vertical offset from the document center.
    pub y: i32,
    /// Nominal font size, always at least 1.
    #[serde(deserialize_with = "deserialize_size")]
    pub size: i32,
}

/// Stored sizes below 1 are raised to 1.
fn deserialize_size<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i32::deserialize(deserializer)?.max(1))
}

impl Emoji {
    fn new(text: String, x: i32, y: i32, size: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            x,
            y,
            size: size.max(1),
        }
    }

    /// Stable identifier assigned at creation.
    pub fn id(&self) -> EmojiId {
        self.id
    }

    /// Font size as a float, for layout.
    pub fn font_size(&self) -> f64 {
        f64::from(self.size)
    }

    /// Document-space location as a point.
    pub fn location(&self) -> kurbo::Point {
        kurbo::Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl PartialEq for Emoji {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Emoji {}

impl Hash for Emoji {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Nearest-even rounding of `size * factor`, never below 1.
///
/// Returns `None` for factors that are not finite or not positive.
pub fn scaled_size(size: i32, factor: f64) -> Option<i32> {
    if !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    let scaled = (f64::from(size) * factor).round_ties_even();
    Some(scaled.clamp(1.0, f64::from(i32::MAX)) as i32)
}

/// The EmojiArt document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiArt {
    /// Image shown behind the emoji, if any.
    #[serde(default)]
    pub background_url: Option<Url>,
    /// Placed emoji in z-order (back to front).
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

impl EmojiArt {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an emoji and return its freshly minted id.
    pub fn add_emoji(&mut self, text: impl Into<String>, x: i32, y: i32, size: i32) -> EmojiId {
        let emoji = Emoji::new(text.into(), x, y, size);
        let id = emoji.id;
        self.emojis.push(emoji);
        id
    }

    /// Remove an emoji, preserving the order of the rest.
    pub fn remove_emoji(&mut self, id: EmojiId) -> Option<Emoji> {
        let index = self.index_of(id)?;
        Some(self.emojis.remove(index))
    }

    /// Get an emoji by ID.
    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    /// Apply an in-place update to the emoji with the given id.
    /// Returns false (and does nothing) if there is no such emoji.
    pub fn mutate_emoji(&mut self, id: EmojiId, update: impl FnOnce(&mut Emoji)) -> bool {
        match self.emojis.iter_mut().find(|e| e.id == id) {
            Some(emoji) => {
                update(emoji);
                true
            }
            None => false,
        }
    }

    /// Offset an emoji by whole document units.
    pub fn move_emoji(&mut self, id: EmojiId, dx: i32, dy: i32) -> bool {
        self.mutate_emoji(id, |emoji| {
            emoji.x = emoji.x.saturating_add(dx);
            emoji.y = emoji.y.saturating_add(dy);
        })
    }

    /// Scale an emoji's size, rounding to nearest even.
    /// Invalid factors leave the document untouched and return false.
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let Some(size) = scaled_size(self.emojis[index].size, factor) else {
            return false;
        };
        self.emojis[index].size = size;
        true
    }

    fn index_of(&self, id: EmojiId) -> Option<usize> {
        self.emojis.iter().position(|e| e.id == id)
    }

    /// Check if the document has no emoji.
    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    /// Get the number of emoji.
    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encode the document as the byte blob handed to storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a document from a stored byte blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decode a stored blob, falling back to an empty document when it is unreadable.
    pub fn from_bytes_or_default(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes).unwrap_or_else(|e| {
            log::warn!("Stored document is unreadable, starting empty: {}", e);
            Self::default()
        })
    }
}

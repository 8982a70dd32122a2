//! Viewport module for pan/zoom transforms and live gestures.
//!
//! Document space has its origin at the canvas center. The viewport keeps a
//! steady-state zoom and pan plus whatever an in-progress gesture adds on top.
//! Gestures only touch the document when they end.

use crate::document::EmojiArtDocument;
use crate::drop::{CanvasFrame, DropLocation};
use crate::emoji_art::{Emoji, EmojiId};
use kurbo::{Point, Size, Vec2};

/// Convert a canvas-local point to document coordinates.
///
/// `pan` is in screen units; `zoom` must be non-zero.
pub fn screen_to_document(point: Point, canvas: Size, pan: Vec2, zoom: f64) -> Point {
    let centered = point - canvas.to_vec2() / 2.0 - pan;
    Point::new(centered.x / zoom, centered.y / zoom)
}

/// Convert a document point to canvas-local coordinates.
pub fn document_to_screen(point: Point, canvas: Size, pan: Vec2, zoom: f64) -> Point {
    Point::new(point.x * zoom, point.y * zoom) + canvas.to_vec2() / 2.0 + pan
}

/// Zoom that fits an image of natural size `image` entirely inside `canvas`.
///
/// `None` when any dimension is zero, negative or not finite.
pub fn fit_zoom(image: Size, canvas: Size) -> Option<f64> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(image.width) && usable(image.height) && usable(canvas.width) && usable(canvas.height)) {
        return None;
    }
    Some((canvas.width / image.width).min(canvas.height / image.height))
}

fn usable_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// What a drag gesture moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// A single unselected emoji.
    Emoji(EmojiId),
    /// Every selected emoji.
    Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoomMode {
    Canvas,
    Selection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    target: DragTarget,
    /// Live offset in document units.
    offset: Vec2,
}

/// Pan/zoom state of the canvas, including in-flight gestures.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    steady_zoom: f64,
    gesture_zoom: f64,
    /// Live pinch factor applied to selected emoji only.
    selection_zoom: f64,
    zoom_mode: Option<ZoomMode>,
    /// Pan in document units; scaled by the zoom for display.
    steady_pan: Vec2,
    gesture_pan: Vec2,
    drag: Option<Drag>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            steady_zoom: 1.0,
            gesture_zoom: 1.0,
            selection_zoom: 1.0,
            zoom_mode: None,
            steady_pan: Vec2::ZERO,
            gesture_pan: Vec2::ZERO,
            drag: None,
        }
    }
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with a given steady zoom and screen-space pan.
    pub fn with_view(zoom: f64, pan: Vec2) -> Self {
        let zoom = if usable_scale(zoom) { zoom } else { 1.0 };
        Self {
            steady_zoom: zoom,
            steady_pan: pan / zoom,
            ..Self::default()
        }
    }

    /// Effective zoom: steady state times the live pinch.
    pub fn zoom_scale(&self) -> f64 {
        self.steady_zoom * self.gesture_zoom
    }

    /// Effective zoom for selected emoji during a selection pinch.
    pub fn selection_zoom_scale(&self) -> f64 {
        self.selection_zoom * self.zoom_scale()
    }

    /// Effective pan in screen units.
    pub fn pan_offset(&self) -> Vec2 {
        (self.steady_pan + self.gesture_pan) * self.zoom_scale()
    }

    /// Live drag offset in screen units.
    pub fn drag_offset(&self) -> Vec2 {
        self.drag
            .map(|d| d.offset * self.zoom_scale())
            .unwrap_or(Vec2::ZERO)
    }

    /// Current drag target, if a drag is in progress.
    pub fn drag_target(&self) -> Option<DragTarget> {
        self.drag.map(|d| d.target)
    }

    /// Check if any gesture is in progress.
    pub fn is_gesturing(&self) -> bool {
        self.zoom_mode.is_some() || self.drag.is_some() || self.gesture_pan != Vec2::ZERO
    }

    // --- Zoom ---

    /// Start a pinch. With a non-empty selection the pinch resizes the
    /// selected emoji instead of zooming the canvas.
    pub fn begin_zoom(&mut self, document: &EmojiArtDocument) {
        self.gesture_zoom = 1.0;
        self.selection_zoom = 1.0;
        self.zoom_mode = Some(if document.selection().is_empty() {
            ZoomMode::Canvas
        } else {
            ZoomMode::Selection
        });
    }

    /// Track the live pinch scale.
    pub fn update_zoom(&mut self, scale: f64) {
        if !usable_scale(scale) {
            return;
        }
        match self.zoom_mode {
            Some(ZoomMode::Canvas) => self.gesture_zoom = scale,
            Some(ZoomMode::Selection) => self.selection_zoom = scale,
            None => {}
        }
    }

    /// Finish a pinch, folding the final scale into the canvas zoom or the
    /// selected emoji sizes.
    pub fn end_zoom(&mut self, scale: f64, document: &mut EmojiArtDocument) {
        let mode = self.zoom_mode.take();
        self.gesture_zoom = 1.0;
        self.selection_zoom = 1.0;
        if !usable_scale(scale) {
            return;
        }
        match mode {
            Some(ZoomMode::Canvas) => {
                self.steady_zoom *= scale;
                log::debug!("Zoom committed: {:.3}", self.steady_zoom);
            }
            Some(ZoomMode::Selection) => document.scale_selection(scale),
            None => {}
        }
    }

    // --- Pan ---

    /// Track the live pan translation (screen units).
    pub fn update_pan(&mut self, translation: Vec2) {
        self.gesture_pan = translation / self.zoom_scale();
    }

    /// Finish a pan, folding the translation into the steady pan.
    pub fn end_pan(&mut self, translation: Vec2) {
        self.steady_pan += translation / self.zoom_scale();
        self.gesture_pan = Vec2::ZERO;
    }

    // --- Drag ---

    /// Start dragging `emoji`. Dragging a selected emoji drags the whole selection.
    pub fn begin_drag(&mut self, emoji: EmojiId, document: &EmojiArtDocument) {
        let target = if document.is_selected(emoji) {
            DragTarget::Selection
        } else {
            DragTarget::Emoji(emoji)
        };
        self.drag = Some(Drag {
            target,
            offset: Vec2::ZERO,
        });
    }

    /// Track the live drag translation (screen units).
    pub fn update_drag(&mut self, translation: Vec2) {
        let zoom = self.zoom_scale();
        if let Some(drag) = &mut self.drag {
            drag.offset = translation / zoom;
        }
    }

    /// Finish a drag, moving the target by the final translation.
    pub fn end_drag(&mut self, translation: Vec2, document: &mut EmojiArtDocument) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let offset = translation / self.zoom_scale();
        match drag.target {
            DragTarget::Emoji(id) => {
                document.move_emoji(id, offset);
            }
            DragTarget::Selection => document.move_selection(offset),
        }
    }

    /// Drop every live gesture without touching the document.
    pub fn cancel_gesture(&mut self) {
        self.gesture_zoom = 1.0;
        self.selection_zoom = 1.0;
        self.zoom_mode = None;
        self.gesture_pan = Vec2::ZERO;
        self.drag = None;
    }

    // --- Layout ---

    /// Check if the live drag applies to this emoji.
    pub fn is_dragging(&self, emoji: EmojiId, document: &EmojiArtDocument) -> bool {
        match self.drag_target() {
            Some(DragTarget::Emoji(id)) => id == emoji,
            Some(DragTarget::Selection) => document.is_selected(emoji),
            None => false,
        }
    }

    /// Canvas-local position of an emoji, including any live drag.
    pub fn position(&self, emoji: &Emoji, canvas: Size, document: &EmojiArtDocument) -> Point {
        let location = document_to_screen(emoji.location(), canvas, self.pan_offset(), self.zoom_scale());
        if self.is_dragging(emoji.id(), document) {
            location + self.drag_offset()
        } else {
            location
        }
    }

    /// Rendered font size of an emoji.
    pub fn font_size(&self, emoji: &Emoji, document: &EmojiArtDocument) -> f64 {
        let scale = if document.is_selected(emoji.id()) {
            self.selection_zoom_scale()
        } else {
            self.zoom_scale()
        };
        emoji.font_size() * scale
    }

    /// Convert a canvas-local point to document coordinates.
    pub fn to_document(&self, point: Point, canvas: Size) -> Point {
        screen_to_document(point, canvas, self.pan_offset(), self.zoom_scale())
    }

    /// Convert a document point to canvas-local coordinates.
    pub fn to_screen(&self, point: Point, canvas: Size) -> Point {
        document_to_screen(point, canvas, self.pan_offset(), self.zoom_scale())
    }

    /// Document-space location of a drop.
    pub fn drop_location(&self, location: &DropLocation, frame: &CanvasFrame) -> Point {
        self.to_document(location.to_local(frame), frame.size)
    }

    /// Zoom so the whole image fits the canvas and recenter.
    /// Does nothing without an image or with a degenerate size.
    pub fn zoom_to_fit(&mut self, image: Option<Size>, canvas: Size) -> bool {
        let Some(zoom) = image.and_then(|image| fit_zoom(image, canvas)) else {
            return false;
        };
        self.steady_pan = Vec2::ZERO;
        self.steady_zoom = zoom;
        true
    }

    /// Reset to 100% with no pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

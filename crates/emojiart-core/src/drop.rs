//! Drag-and-drop payloads and drop locations.
//!
//! Platforms do not always report both axes of a drop point in the same
//! coordinate space, so each axis carries its own space and is normalized
//! against the canvas frame before any view transform runs.

use crate::document::EmojiArtDocument;
use crate::viewport::Viewport;
use kurbo::{Point, Size};
use url::Url;

/// Coordinate space a drop axis is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSpace {
    /// Relative to the canvas's top-left corner.
    #[default]
    Local,
    /// Relative to the window (or screen) the canvas sits in.
    Global,
}

/// Placement of the canvas inside the global coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasFrame {
    /// Canvas top-left corner in global coordinates.
    pub origin: Point,
    /// Canvas extent.
    pub size: Size,
}

impl CanvasFrame {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// A frame whose local and global spaces coincide.
    pub fn at_origin(size: Size) -> Self {
        Self::new(Point::ZERO, size)
    }
}

/// Where a drop landed, with the space of each axis stated explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropLocation {
    pub x: f64,
    pub x_space: CoordinateSpace,
    pub y: f64,
    pub y_space: CoordinateSpace,
}

impl DropLocation {
    pub fn new(x: f64, x_space: CoordinateSpace, y: f64, y_space: CoordinateSpace) -> Self {
        Self {
            x,
            x_space,
            y,
            y_space,
        }
    }

    /// Both axes in canvas-local coordinates.
    pub fn local(point: Point) -> Self {
        Self::new(point.x, CoordinateSpace::Local, point.y, CoordinateSpace::Local)
    }

    /// Both axes in global coordinates.
    pub fn global(point: Point) -> Self {
        Self::new(point.x, CoordinateSpace::Global, point.y, CoordinateSpace::Global)
    }

    /// Canvas-local point.
    pub fn to_local(&self, frame: &CanvasFrame) -> Point {
        let axis = |value: f64, space: CoordinateSpace, origin: f64| match space {
            CoordinateSpace::Local => value,
            CoordinateSpace::Global => value - origin,
        };
        Point::new(
            axis(self.x, self.x_space, frame.origin.x),
            axis(self.y, self.y_space, frame.origin.y),
        )
    }
}

/// One item carried by a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A link to an image; becomes the background.
    Url(Url),
    /// Text; each non-empty string becomes an emoji.
    Text(String),
}

/// Convert the drop location and hand the payloads to the document.
///
/// Returns whether anything was accepted.
pub fn handle_drop(
    document: &mut EmojiArtDocument,
    viewport: &Viewport,
    payloads: &[DropPayload],
    location: &DropLocation,
    frame: &CanvasFrame,
) -> bool {
    let at = viewport.drop_location(location, frame);
    document.drop_payloads(payloads, at)
}

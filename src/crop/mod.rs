//! Crop-region controller: the normalized rectangle the user drags over the video frame.
//!
//! Rectangle coordinates are percentages of the displayed container (0 to 100). Pointer
//! positions arrive in container pixels and are converted with the container's measured size.
//! One drag session may be active at a time; a two-pointer pinch is tracked separately and the
//! two never overlap.

mod pinch;

pub use pinch::{PinchGesture, ZoomCapability};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Smallest width or height, in percent, a resize may produce.
pub const MIN_SIZE: f64 = 10.0;

/// Slack for float accumulation when checking containment.
const EPSILON: f64 = 1e-9;

/// Pointer position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Measured size of the displayed container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or NaN.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Normalized crop rectangle over the displayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropRect {
    /// A wide band centered vertically, sized for a line or two of text.
    fn default() -> Self {
        Self {
            top: 35.0,
            left: 7.5,
            width: 85.0,
            height: 30.0,
        }
    }
}

impl CropRect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Checks containment in the frame and the minimum size.
    pub fn is_valid(&self) -> bool {
        self.left >= -EPSILON
            && self.top >= -EPSILON
            && self.width >= MIN_SIZE - EPSILON
            && self.height >= MIN_SIZE - EPSILON
            && self.right() <= 100.0 + EPSILON
            && self.bottom() <= 100.0 + EPSILON
    }
}

/// The nine grab targets on the crop overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Move,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Which side of an axis a handle drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// Top or left: moves the origin, the far side stays fixed.
    Leading,
    /// Bottom or right: changes the extent, the origin stays fixed.
    Trailing,
}

impl Handle {
    pub const ALL: [Handle; 9] = [
        Handle::Move,
        Handle::Top,
        Handle::Bottom,
        Handle::Left,
        Handle::Right,
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    fn horizontal_edge(self) -> Option<Edge> {
        match self {
            Self::Left | Self::TopLeft | Self::BottomLeft => Some(Edge::Leading),
            Self::Right | Self::TopRight | Self::BottomRight => Some(Edge::Trailing),
            Self::Move | Self::Top | Self::Bottom => None,
        }
    }

    fn vertical_edge(self) -> Option<Edge> {
        match self {
            Self::Top | Self::TopLeft | Self::TopRight => Some(Edge::Leading),
            Self::Bottom | Self::BottomLeft | Self::BottomRight => Some(Edge::Trailing),
            Self::Move | Self::Left | Self::Right => None,
        }
    }
}

/// Translates one axis, keeping the span inside the frame.
fn translate_axis(start: f64, size: f64, delta: f64) -> f64 {
    (start + delta).min(100.0 - size).max(0.0)
}

/// Resizes one axis from its baseline `(start, size)` and returns the new pair.
///
/// A trailing edge is limited by `MIN_SIZE` and the frame's far side. A leading edge keeps the
/// far side fixed and is dropped entirely when the new origin would leave the frame.
fn resize_axis(start: f64, size: f64, delta: f64, edge: Edge) -> (f64, f64) {
    match edge {
        Edge::Trailing => (start, (size + delta).min(100.0 - start).max(MIN_SIZE)),
        Edge::Leading => {
            let new_size = (size - delta).max(MIN_SIZE);
            let new_start = start + size - new_size;
            if new_start >= 0.0 {
                (new_start, new_size)
            } else {
                (start, size)
            }
        }
    }
}

/// An in-progress single-pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub handle: Handle,
    pub start_pointer: Point,
    pub start_rect: CropRect,
}

impl DragSession {
    /// Rectangle produced by dragging from the session origin to `pointer`.
    ///
    /// Returns `None` when the container has no measurable size.
    pub fn apply(&self, pointer: Point, container: Size) -> Option<CropRect> {
        if container.is_empty() {
            return None;
        }
        let dx = (pointer.x - self.start_pointer.x) / container.width * 100.0;
        let dy = (pointer.y - self.start_pointer.y) / container.height * 100.0;
        if !dx.is_finite() || !dy.is_finite() {
            return None;
        }

        let base = self.start_rect;
        let mut rect = base;

        if self.handle == Handle::Move {
            rect.left = translate_axis(base.left, base.width, dx);
            rect.top = translate_axis(base.top, base.height, dy);
            return Some(rect);
        }

        if let Some(edge) = self.handle.horizontal_edge() {
            (rect.left, rect.width) = resize_axis(base.left, base.width, dx, edge);
        }
        if let Some(edge) = self.handle.vertical_edge() {
            (rect.top, rect.height) = resize_axis(base.top, base.height, dy, edge);
        }
        Some(rect)
    }
}

/// Owns the crop rectangle and the active gesture, if any.
#[derive(Debug, Clone, Default)]
pub struct CropController {
    rect: CropRect,
    drag: Option<DragSession>,
    pinch: Option<PinchGesture>,
}

impl CropController {
    pub fn new(rect: CropRect) -> Self {
        Self {
            rect,
            drag: None,
            pinch: None,
        }
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Starts a drag on `handle`, replacing any previous session. Ignored while pinching.
    pub fn begin_drag(&mut self, handle: Handle, pointer: Point) -> bool {
        if self.pinch.is_some() {
            debug!(handle = handle.as_str(), "Drag ignored during pinch");
            return false;
        }
        self.drag = Some(DragSession {
            handle,
            start_pointer: pointer,
            start_rect: self.rect,
        });
        trace!(handle = handle.as_str(), "Drag started");
        true
    }

    /// Applies the pointer movement to the rectangle. Returns the new rectangle when it changed
    /// anything.
    pub fn update_drag(&mut self, pointer: Point, container: Size) -> Option<CropRect> {
        let session = self.drag?;
        let rect = session.apply(pointer, container)?;
        self.rect = rect;
        Some(rect)
    }

    /// Ends the drag session. Returns whether one was active.
    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Starts a pinch between two pointers. Skipped while a drag is active, when the camera
    /// cannot zoom, or when the pointers coincide.
    pub fn begin_pinch(&mut self, a: Point, b: Point, zoom: Option<ZoomCapability>) -> bool {
        if self.drag.is_some() {
            debug!("Pinch ignored during drag");
            return false;
        }
        let Some(zoom) = zoom else {
            debug!("Pinch ignored: camera has no zoom capability");
            return false;
        };
        self.pinch = PinchGesture::start(a, b, zoom.current);
        self.pinch.is_some()
    }

    /// Zoom level the current pinch asks for, clamped to the camera's range.
    pub fn update_pinch(&mut self, a: Point, b: Point, zoom: ZoomCapability) -> Option<f64> {
        if self.drag.is_some() {
            return None;
        }
        self.pinch.map(|pinch| pinch.zoom_for(a, b, &zoom))
    }

    pub fn end_pinch(&mut self) -> bool {
        self.pinch.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: Size = Size {
        width: 400.0,
        height: 800.0,
    };

    fn drag_to(rect: CropRect, handle: Handle, dx_pct: f64, dy_pct: f64) -> CropRect {
        let mut controller = CropController::new(rect);
        controller.begin_drag(handle, Point::new(100.0, 100.0));
        controller.update_drag(
            Point::new(
                100.0 + dx_pct * CONTAINER.width / 100.0,
                100.0 + dy_pct * CONTAINER.height / 100.0,
            ),
            CONTAINER,
        );
        controller.rect()
    }

    #[test]
    fn test_handle_names_round_trip() {
        for handle in Handle::ALL {
            assert_eq!(Handle::from_str(handle.as_str()), Some(handle));
        }
        assert_eq!(Handle::from_str("middle"), None);
    }

    #[test]
    fn test_move_clamps_to_right_edge() {
        let rect = drag_to(CropRect::default(), Handle::Move, 20.0, 0.0);
        assert_eq!(rect.left, 15.0);
        assert_eq!(rect.width, 85.0);
        assert_eq!(rect.top, 35.0);
    }

    #[test]
    fn test_move_clamps_to_origin() {
        let rect = drag_to(CropRect::default(), Handle::Move, -50.0, -80.0);
        assert_eq!(rect.left, 0.0);
        assert_eq!(rect.top, 0.0);
        assert_eq!(rect.height, 30.0);
    }

    #[test]
    fn test_right_handle_grows_until_frame_edge() {
        let rect = drag_to(CropRect::new(10.0, 20.0, 30.0, 30.0), Handle::Right, 100.0, 0.0);
        assert_eq!(rect.left, 20.0);
        assert_eq!(rect.width, 80.0);
    }

    #[test]
    fn test_bottom_handle_respects_min_size() {
        let rect = drag_to(CropRect::new(10.0, 20.0, 30.0, 30.0), Handle::Bottom, 0.0, -90.0);
        assert_eq!(rect.top, 10.0);
        assert_eq!(rect.height, MIN_SIZE);
    }

    #[test]
    fn test_left_handle_keeps_right_edge_fixed() {
        let rect = drag_to(CropRect::new(10.0, 20.0, 30.0, 30.0), Handle::Left, -5.0, 0.0);
        assert_eq!(rect.left, 15.0);
        assert_eq!(rect.width, 35.0);
        assert_eq!(rect.right(), 50.0);
    }

    #[test]
    fn test_left_handle_past_frame_keeps_baseline() {
        let base = CropRect::new(10.0, 20.0, 30.0, 30.0);
        let rect = drag_to(base, Handle::Left, -25.0, 0.0);
        assert_eq!(rect.left, base.left);
        assert_eq!(rect.width, base.width);
    }

    #[test]
    fn test_top_left_shrinks_both_axes_to_min() {
        let rect = drag_to(CropRect::new(10.0, 20.0, 30.0, 30.0), Handle::TopLeft, 60.0, 60.0);
        assert_eq!(rect.width, MIN_SIZE);
        assert_eq!(rect.height, MIN_SIZE);
        assert_eq!(rect.right(), 50.0);
        assert_eq!(rect.bottom(), 40.0);
    }

    #[test]
    fn test_edge_handle_leaves_other_axis_alone() {
        let base = CropRect::new(10.0, 20.0, 30.0, 30.0);
        let rect = drag_to(base, Handle::Top, 25.0, -5.0);
        assert_eq!(rect.left, base.left);
        assert_eq!(rect.width, base.width);
        assert_eq!(rect.top, 5.0);
        assert_eq!(rect.height, 35.0);
    }

    #[test]
    fn test_every_drag_keeps_rect_valid() {
        let starts = [
            CropRect::default(),
            CropRect::new(0.0, 0.0, 10.0, 10.0),
            CropRect::new(90.0, 90.0, 10.0, 10.0),
            CropRect::new(0.0, 0.0, 100.0, 100.0),
            CropRect::new(33.3, 12.1, 41.7, 27.9),
        ];
        let deltas = [-150.0, -40.0, -7.3, 0.0, 3.3, 25.0, 120.0];
        for start in starts {
            for handle in Handle::ALL {
                for dx in deltas {
                    for dy in deltas {
                        let rect = drag_to(start, handle, dx, dy);
                        assert!(
                            rect.is_valid(),
                            "{handle:?} from {start:?} by ({dx}, {dy}) gave {rect:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_deltas_are_relative_to_session_origin() {
        let mut controller = CropController::default();
        controller.begin_drag(Handle::Move, Point::new(0.0, 0.0));
        controller.update_drag(Point::new(-40.0, 0.0), CONTAINER);
        controller.update_drag(Point::new(-20.0, 0.0), CONTAINER);
        assert_eq!(controller.rect().left, 2.5);
    }

    #[test]
    fn test_update_without_session_is_noop() {
        let mut controller = CropController::default();
        assert!(controller.update_drag(Point::new(50.0, 50.0), CONTAINER).is_none());
        assert_eq!(controller.rect(), CropRect::default());
    }

    #[test]
    fn test_update_with_empty_container_is_noop() {
        let mut controller = CropController::default();
        controller.begin_drag(Handle::Move, Point::new(0.0, 0.0));
        assert!(controller
            .update_drag(Point::new(50.0, 50.0), Size::new(0.0, 800.0))
            .is_none());
        assert_eq!(controller.rect(), CropRect::default());
    }

    #[test]
    fn test_end_drag_is_idempotent() {
        let mut controller = CropController::default();
        controller.begin_drag(Handle::BottomRight, Point::new(0.0, 0.0));
        assert!(controller.end_drag());
        assert!(!controller.end_drag());
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_pinch_and_drag_are_exclusive() {
        let zoom = ZoomCapability::new(1.0, 4.0, 1.0);
        let mut controller = CropController::default();
        controller.begin_drag(Handle::Move, Point::new(0.0, 0.0));
        assert!(!controller.begin_pinch(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Some(zoom)));

        controller.end_drag();
        assert!(controller.begin_pinch(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Some(zoom)));
        assert!(!controller.begin_drag(Handle::Move, Point::new(0.0, 0.0)));
        assert_eq!(
            controller.update_pinch(Point::new(0.0, 0.0), Point::new(20.0, 0.0), zoom),
            Some(2.0)
        );
    }

    #[test]
    fn test_pinch_requires_zoom_capability() {
        let mut controller = CropController::default();
        assert!(!controller.begin_pinch(Point::new(0.0, 0.0), Point::new(10.0, 0.0), None));
        assert!(!controller.is_pinching());
    }
}

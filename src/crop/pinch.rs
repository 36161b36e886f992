//! Two-pointer pinch that drives the camera's zoom.

use serde::{Deserialize, Serialize};

use super::Point;

/// Zoom range and current level reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCapability {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

impl ZoomCapability {
    pub fn new(min: f64, max: f64, current: f64) -> Self {
        Self { min, max, current }
    }

    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    initial_distance: f64,
    initial_zoom: f64,
}

impl PinchGesture {
    /// Returns `None` when the two pointers coincide, since no ratio can be derived from them.
    pub fn start(a: Point, b: Point, initial_zoom: f64) -> Option<Self> {
        let initial_distance = a.distance(b);
        (initial_distance > 0.0 && initial_distance.is_finite()).then_some(Self {
            initial_distance,
            initial_zoom,
        })
    }

    pub fn zoom_for(&self, a: Point, b: Point, capability: &ZoomCapability) -> f64 {
        let ratio = a.distance(b) / self.initial_distance;
        capability.clamp(self.initial_zoom * ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_scales_with_distance_and_clamps() {
        let cap = ZoomCapability::new(1.0, 3.0, 1.5);
        let pinch = PinchGesture::start(Point::new(0.0, 0.0), Point::new(0.0, 100.0), 1.5).unwrap();

        assert_eq!(pinch.zoom_for(Point::new(0.0, 0.0), Point::new(0.0, 150.0), &cap), 2.25);
        assert_eq!(pinch.zoom_for(Point::new(0.0, 0.0), Point::new(0.0, 400.0), &cap), 3.0);
        assert_eq!(pinch.zoom_for(Point::new(0.0, 0.0), Point::new(0.0, 10.0), &cap), 1.0);
    }

    #[test]
    fn test_coincident_pointers_do_not_start() {
        assert!(PinchGesture::start(Point::new(5.0, 5.0), Point::new(5.0, 5.0), 1.0).is_none());
    }
}

//! Frame-to-source mapping.
//!
//! The video element scales the source frame with cover-fit: the frame fills the element and the
//! overflowing sides are cut off. The crop rectangle is expressed over what the user sees, so it
//! has to be mapped through the visible part of the source frame before any pixels are copied.

use serde::{Deserialize, Serialize};

use crate::crop::CropRect;

/// Part of the source frame that is visible under cover-fit, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRegion {
    pub width: f64,
    pub height: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

/// Crop rectangle in source pixels, still fractional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceCrop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn is_positive(v: f64) -> bool {
    v > 0.0 && v.is_finite()
}

/// Computes the visible sub-rectangle of a `source_w`×`source_h` frame shown in a
/// `display_w`×`display_h` element.
///
/// Returns `None` while the frame or the element has no size yet.
pub fn visible_region(
    source_w: f64,
    source_h: f64,
    display_w: f64,
    display_h: f64,
) -> Option<VisibleRegion> {
    if ![source_w, source_h, display_w, display_h]
        .into_iter()
        .all(is_positive)
    {
        return None;
    }

    let source_ratio = source_w / source_h;
    let display_ratio = display_w / display_h;

    let region = if source_ratio > display_ratio {
        // Source is wider: full height is visible, sides are cut.
        let width = source_h * display_ratio;
        VisibleRegion {
            width,
            height: source_h,
            x_offset: (source_w - width) / 2.0,
            y_offset: 0.0,
        }
    } else {
        let height = source_w / display_ratio;
        VisibleRegion {
            width: source_w,
            height,
            x_offset: 0.0,
            y_offset: (source_h - height) / 2.0,
        }
    };
    Some(region)
}

impl VisibleRegion {
    /// Maps a normalized crop rectangle into source pixels.
    pub fn map(&self, rect: &CropRect) -> SourceCrop {
        SourceCrop {
            x: self.x_offset + self.width * (rect.left / 100.0),
            y: self.y_offset + self.height * (rect.top / 100.0),
            width: self.width * (rect.width / 100.0),
            height: self.height * (rect.height / 100.0),
        }
    }
}

/// Convenience for the whole transform. `None` when the frame is not ready.
pub fn map_crop(
    source: (u32, u32),
    display: (f64, f64),
    rect: &CropRect,
) -> Option<SourceCrop> {
    visible_region(
        f64::from(source.0),
        f64::from(source.1),
        display.0,
        display.1,
    )
    .map(|region| region.map(rect))
}

impl SourceCrop {
    /// Whole-pixel rectangle `(x, y, width, height)` clamped to a `frame_w`×`frame_h` frame.
    ///
    /// The origin is floored and the far corner ceiled so no partially covered pixel is lost.
    pub fn to_pixels(&self, frame_w: u32, frame_h: u32) -> (u32, u32, u32, u32) {
        let clamp = |v: f64, max: u32| -> u32 { v.max(0.0).min(f64::from(max)) as u32 };
        let x0 = clamp(self.x.floor(), frame_w);
        let y0 = clamp(self.y.floor(), frame_h);
        let x1 = clamp((self.x + self.width).ceil(), frame_w);
        let y1 = clamp((self.y + self.height).ceil(), frame_h);
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_source_in_portrait_display() {
        let region = visible_region(1920.0, 1080.0, 400.0, 800.0).unwrap();
        assert_eq!(region.height, 1080.0);
        assert_eq!(region.width, 540.0);
        assert_eq!(region.x_offset, 690.0);
        assert_eq!(region.y_offset, 0.0);
    }

    #[test]
    fn test_default_rect_maps_to_source_pixels() {
        let crop = map_crop((1920, 1080), (400.0, 800.0), &CropRect::default()).unwrap();
        assert!((crop.x - 730.5).abs() < 1e-9);
        assert!((crop.y - 378.0).abs() < 1e-9);
        assert!((crop.width - 459.0).abs() < 1e-9);
        assert!((crop.height - 324.0).abs() < 1e-9);
    }

    #[test]
    fn test_tall_source_in_wide_display() {
        let region = visible_region(1080.0, 1920.0, 800.0, 400.0).unwrap();
        assert_eq!(region.width, 1080.0);
        assert_eq!(region.height, 540.0);
        assert_eq!(region.x_offset, 0.0);
        assert_eq!(region.y_offset, 690.0);
    }

    #[test]
    fn test_matching_aspect_shows_whole_frame() {
        let region = visible_region(1280.0, 720.0, 640.0, 360.0).unwrap();
        assert_eq!(region.width, 1280.0);
        assert!((region.height - 720.0).abs() < 1e-9);
        assert_eq!(region.x_offset, 0.0);
        assert!(region.y_offset.abs() < 1e-9);
    }

    #[test]
    fn test_frame_not_ready() {
        assert!(visible_region(1920.0, 0.0, 400.0, 800.0).is_none());
        assert!(map_crop((0, 0), (400.0, 800.0), &CropRect::default()).is_none());
        assert!(visible_region(1920.0, 1080.0, 0.0, 800.0).is_none());
    }

    #[test]
    fn test_pixel_rounding_covers_partial_pixels() {
        let crop = SourceCrop {
            x: 730.5,
            y: 378.0,
            width: 459.0,
            height: 324.0,
        };
        assert_eq!(crop.to_pixels(1920, 1080), (730, 378, 460, 324));
    }

    #[test]
    fn test_pixel_rounding_clamps_to_frame() {
        let crop = SourceCrop {
            x: -3.2,
            y: 1070.0,
            width: 50.0,
            height: 40.0,
        };
        assert_eq!(crop.to_pixels(1920, 1080), (0, 1070, 47, 10));
    }
}

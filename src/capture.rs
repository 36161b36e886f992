//! Pixel copy and encoding of the selected region.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use crate::extraction::EncodedImage;
use crate::mapper::SourceCrop;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Crop region {width}x{height} at ({x}, {y}) is empty")]
    EmptyRegion { x: u32, y: u32, width: u32, height: u32 },
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Copies the source-pixel crop out of `frame`.
pub fn copy_region(frame: &DynamicImage, crop: &SourceCrop) -> Result<DynamicImage, CaptureError> {
    let (x, y, width, height) = crop.to_pixels(frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(CaptureError::EmptyRegion {
            x,
            y,
            width,
            height,
        });
    }
    debug!(x, y, width, height, "Copying crop region");
    Ok(frame.crop_imm(x, y, width, height))
}

/// Encodes as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<EncodedImage, CaptureError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    debug!(bytes = bytes.len(), quality, "Encoded capture");
    Ok(EncodedImage::jpeg(bytes))
}

/// Crops `frame` and encodes the result.
pub fn capture_region(
    frame: &DynamicImage,
    crop: &SourceCrop,
    quality: u8,
) -> Result<EncodedImage, CaptureError> {
    encode_jpeg(&copy_region(frame, crop)?, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_copy_region_size() {
        let frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1920, 1080, Rgba([9, 9, 9, 255])));
        let crop = SourceCrop {
            x: 730.5,
            y: 378.0,
            width: 459.0,
            height: 324.0,
        };
        let region = copy_region(&frame, &crop).unwrap();
        assert_eq!((region.width(), region.height()), (460, 324));
    }

    #[test]
    fn test_copy_region_outside_frame_is_empty() {
        let frame = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        let crop = SourceCrop {
            x: 20.0,
            y: 0.0,
            width: 5.0,
            height: 5.0,
        };
        assert!(matches!(
            copy_region(&frame, &crop),
            Err(CaptureError::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 8, Rgba([200, 10, 10, 128])));
        let encoded = encode_jpeg(&image, 90).unwrap();
        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!(&encoded.bytes[..2], &[0xff, 0xd8]);

        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}

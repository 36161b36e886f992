//! File-backed camera: serves a decoded image as the live frame.
//!
//! Zoom is digital: the frame is center-cropped by the zoom factor and scaled back to the native
//! size, so frame dimensions stay constant for the mapper.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info, warn};

use super::{CameraError, CameraRequest, CameraSource, StreamInfo};
use crate::crop::ZoomCapability;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 4.0;

#[derive(Debug)]
pub struct StillFrameCamera {
    path: Option<PathBuf>,
    source: Option<Arc<DynamicImage>>,
    frame: Option<Arc<DynamicImage>>,
    zoom: f64,
}

impl StillFrameCamera {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            source: None,
            frame: None,
            zoom: MIN_ZOOM,
        }
    }

    /// Camera over an already decoded image. Used when frames come from memory.
    pub fn from_image(image: DynamicImage) -> Self {
        let mut camera = Self::new(None);
        camera.source = Some(Arc::new(image));
        camera
    }

    fn load_source(&mut self) -> Result<Arc<DynamicImage>, CameraError> {
        if let Some(source) = &self.source {
            return Ok(Arc::clone(source));
        }
        let Some(path) = &self.path else {
            return Err(CameraError::Unsupported);
        };

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            _ => CameraError::Unavailable(format!("{}: {e}", path.display())),
        })?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| CameraError::Unavailable(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), width = image.width(), height = image.height(), "Frame source decoded");

        let image = Arc::new(image);
        self.source = Some(Arc::clone(&image));
        Ok(image)
    }

    fn zoomed(source: &DynamicImage, zoom: f64) -> DynamicImage {
        if zoom <= MIN_ZOOM {
            return source.clone();
        }
        let (w, h) = (source.width(), source.height());
        let crop_w = ((f64::from(w) / zoom).round() as u32).clamp(1, w);
        let crop_h = ((f64::from(h) / zoom).round() as u32).clamp(1, h);
        let x = (w - crop_w) / 2;
        let y = (h - crop_h) / 2;
        source
            .crop_imm(x, y, crop_w, crop_h)
            .resize_exact(w, h, FilterType::Triangle)
    }
}

impl CameraSource for StillFrameCamera {
    fn acquire(&mut self, request: &CameraRequest) -> Result<StreamInfo, CameraError> {
        if self.frame.is_some() {
            warn!("Camera acquire while a stream is running");
            return Err(CameraError::Busy);
        }

        let source = self.load_source()?;
        if source.width() == 0 || source.height() == 0 {
            return Err(CameraError::Unavailable("frame source is empty".to_string()));
        }

        self.zoom = MIN_ZOOM;
        self.frame = Some(Arc::clone(&source));
        info!(
            facing = request.facing.as_str(),
            ideal_width = request.ideal_width,
            ideal_height = request.ideal_height,
            width = source.width(),
            height = source.height(),
            "Camera stream started"
        );

        Ok(StreamInfo {
            width: source.width(),
            height: source.height(),
            zoom: self.zoom(),
        })
    }

    fn stop(&mut self) {
        if self.frame.take().is_some() {
            debug!("Camera stream stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.frame.is_some()
    }

    fn frame(&self) -> Option<Arc<DynamicImage>> {
        self.frame.clone()
    }

    fn zoom(&self) -> Option<ZoomCapability> {
        self.frame
            .as_ref()
            .map(|_| ZoomCapability::new(MIN_ZOOM, MAX_ZOOM, self.zoom))
    }

    fn set_zoom(&mut self, zoom: f64) -> Result<f64, CameraError> {
        if self.frame.is_none() {
            return Err(CameraError::Unavailable("no active stream".to_string()));
        }
        let source = self.load_source()?;
        let zoom = zoom.max(MIN_ZOOM).min(MAX_ZOOM);
        self.frame = Some(Arc::new(Self::zoomed(&source, zoom)));
        self.zoom = zoom;
        debug!(zoom, "Camera zoom applied");
        Ok(zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }))
    }

    #[test]
    fn test_acquire_reports_native_size_and_zoom() {
        let mut camera = StillFrameCamera::from_image(checker(64, 32));
        let info = camera.acquire(&CameraRequest::default()).unwrap();
        assert_eq!((info.width, info.height), (64, 32));
        assert_eq!(info.zoom, Some(ZoomCapability::new(1.0, 4.0, 1.0)));
        assert!(camera.is_active());
    }

    #[test]
    fn test_second_acquire_without_stop_is_busy() {
        let mut camera = StillFrameCamera::from_image(checker(8, 8));
        camera.acquire(&CameraRequest::default()).unwrap();
        assert_eq!(
            camera.acquire(&CameraRequest::default()),
            Err(CameraError::Busy)
        );
        camera.stop();
        assert!(camera.acquire(&CameraRequest::default()).is_ok());
    }

    #[test]
    fn test_missing_source_is_unsupported() {
        let mut camera = StillFrameCamera::new(None);
        assert_eq!(
            camera.acquire(&CameraRequest::default()),
            Err(CameraError::Unsupported)
        );
    }

    #[test]
    fn test_unreadable_file_is_unavailable() {
        let mut camera = StillFrameCamera::new(Some(PathBuf::from("/nonexistent/frame.png")));
        assert!(matches!(
            camera.acquire(&CameraRequest::default()),
            Err(CameraError::Unavailable(_))
        ));
    }

    #[test]
    fn test_zoom_keeps_frame_size_and_clamps() {
        let mut camera = StillFrameCamera::from_image(checker(64, 32));
        camera.acquire(&CameraRequest::default()).unwrap();

        assert_eq!(camera.set_zoom(9.0).unwrap(), 4.0);
        let frame = camera.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 32));
        assert_eq!(camera.zoom().unwrap().current, 4.0);
    }

    #[test]
    fn test_zoom_without_stream_fails() {
        let mut camera = StillFrameCamera::from_image(checker(8, 8));
        assert!(camera.set_zoom(2.0).is_err());
    }
}

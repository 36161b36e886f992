//! Camera acquisition.
//!
//! The orchestration layer only sees [`CameraSource`]: acquire a stream for a request, read the
//! current frame, drive zoom, stop. Acquiring again without stopping first is treated as device
//! contention, so callers always stop the previous stream before reacquiring.

mod still;

pub use still::StillFrameCamera;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crop::ZoomCapability;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access is not supported here")]
    Unsupported,
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("Camera is busy")]
    Busy,
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
}

impl CameraError {
    /// Message shown on the persistent error screen next to the retry action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => "This device does not support camera access.".to_string(),
            Self::PermissionDenied => {
                "Camera permission denied. Allow camera access, then retry.".to_string()
            }
            Self::Busy => {
                "The camera is in use by another application. Close it, then retry.".to_string()
            }
            Self::Unavailable(reason) => format!("Could not start the camera: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed away from the user.
    #[default]
    Environment,
    User,
}

impl FacingMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "environment" => Some(Self::Environment),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

/// What the application asks the camera for. Resolution is a preference, not a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRequest {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraRequest {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// Description of a live stream right after acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub zoom: Option<ZoomCapability>,
}

pub trait CameraSource {
    fn acquire(&mut self, request: &CameraRequest) -> Result<StreamInfo, CameraError>;

    /// Stops every track of the current stream. No-op when nothing is running.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Latest frame, or `None` until the stream has produced one.
    fn frame(&self) -> Option<Arc<DynamicImage>>;

    fn zoom(&self) -> Option<ZoomCapability>;

    /// Applies a zoom level and returns the level actually in effect.
    fn set_zoom(&mut self, zoom: f64) -> Result<f64, CameraError>;
}

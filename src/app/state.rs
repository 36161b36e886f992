//! Application state and the reducer that is the only place it changes.
//!
//! `reduce` never performs I/O. It returns the [`Effect`]s the runtime must carry out; results
//! of those effects come back in as further [`Event`]s.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::camera::CameraError;
use crate::crop::{CropController, CropRect, Handle, Point, Size, ZoomCapability};
use crate::extraction::ExtractionError;
use crate::history::{ExtractionRecord, History};
use crate::mapper::{self, SourceCrop};

pub const SETUP_PROMPT: &str = "Add an API key to start extracting text.";

/// Identifies one extraction request so a stale result can never land on a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

/// What the screen shows. `Error` is reserved for camera acquisition failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Status {
    Idle,
    Processing { request: RequestId },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Transient toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyTarget {
    Latest,
    Record(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ContainerResized(Size),
    BeginDrag { handle: Handle, pointer: Point },
    UpdateDrag(Point),
    EndDrag,
    /// Two pointers down. The first event of a gesture starts the pinch.
    PinchMoved(Point, Point),
    PinchEnded,
    CameraReady { zoom: Option<ZoomCapability> },
    CameraFailed(CameraError),
    ZoomApplied(f64),
    RetryCamera,
    VisibilityChanged(bool),
    /// `frame` is the native size of the current frame, `None` before the first one arrives.
    CaptureRequested { frame: Option<(u32, u32)> },
    ExtractionFinished {
        request: RequestId,
        result: Result<ExtractionRecord, ExtractionError>,
    },
    CopyText(CopyTarget),
    DeleteRecord(String),
    ClearHistory,
    DismissNotice,
    CloseResult,
    SetCredential(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Stop any running stream, then acquire a new one.
    AcquireCamera,
    StopCamera,
    SetZoom(f64),
    Extract { request: RequestId, crop: SourceCrop },
    CopyToClipboard(String),
    StoreCredential(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub crop: CropController,
    pub container: Size,
    pub zoom: Option<ZoomCapability>,
    pub camera_live: bool,
    pub camera_error: Option<String>,
    pub credential_missing: bool,
    pub in_flight: Option<RequestId>,
    pub history: History,
    pub latest: Option<ExtractionRecord>,
    pub notice: Option<Notice>,
    next_request: u64,
}

impl AppState {
    pub fn new(container: Size, credential_present: bool) -> Self {
        Self {
            crop: CropController::new(CropRect::default()),
            container,
            zoom: None,
            camera_live: false,
            camera_error: None,
            credential_missing: !credential_present,
            in_flight: None,
            history: History::new(),
            latest: None,
            notice: None,
            next_request: 1,
        }
    }

    pub fn status(&self) -> Status {
        if let Some(message) = &self.camera_error {
            Status::Error {
                message: message.clone(),
            }
        } else if let Some(request) = self.in_flight {
            Status::Processing { request }
        } else {
            Status::Idle
        }
    }

    fn allocate_request(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }
}

pub fn reduce(state: &mut AppState, event: Event) -> Vec<Effect> {
    match event {
        Event::ContainerResized(size) => {
            state.container = size;
            Vec::new()
        }
        Event::BeginDrag { handle, pointer } => {
            state.crop.begin_drag(handle, pointer);
            Vec::new()
        }
        Event::UpdateDrag(pointer) => {
            state.crop.update_drag(pointer, state.container);
            Vec::new()
        }
        Event::EndDrag => {
            state.crop.end_drag();
            Vec::new()
        }
        Event::PinchMoved(a, b) => {
            if state.crop.is_dragging() {
                return Vec::new();
            }
            if !state.crop.is_pinching() {
                state.crop.begin_pinch(a, b, state.zoom);
                return Vec::new();
            }
            let Some(zoom) = state.zoom else {
                return Vec::new();
            };
            match state.crop.update_pinch(a, b, zoom) {
                Some(level) if level != zoom.current => vec![Effect::SetZoom(level)],
                _ => Vec::new(),
            }
        }
        Event::PinchEnded => {
            state.crop.end_pinch();
            Vec::new()
        }
        Event::CameraReady { zoom } => {
            info!(zoom = zoom.is_some(), "Camera ready");
            state.camera_live = true;
            state.camera_error = None;
            state.zoom = zoom;
            Vec::new()
        }
        Event::CameraFailed(error) => {
            warn!(error = %error, "Camera unavailable");
            state.camera_live = false;
            state.zoom = None;
            state.crop.end_pinch();
            state.camera_error = Some(error.user_message());
            Vec::new()
        }
        Event::ZoomApplied(level) => {
            if let Some(zoom) = state.zoom.as_mut() {
                zoom.current = level;
            }
            Vec::new()
        }
        Event::RetryCamera => {
            if state.camera_error.is_none() {
                debug!("Retry ignored: camera is not in error");
                return Vec::new();
            }
            vec![Effect::AcquireCamera]
        }
        Event::VisibilityChanged(true) => vec![Effect::AcquireCamera],
        Event::VisibilityChanged(false) => {
            state.camera_live = false;
            state.crop.end_pinch();
            vec![Effect::StopCamera]
        }
        Event::CaptureRequested { frame } => request_capture(state, frame),
        Event::ExtractionFinished { request, result } => {
            if state.in_flight != Some(request) {
                debug!(request = request.0, "Stale extraction result ignored");
                return Vec::new();
            }
            state.in_flight = None;
            match result {
                Ok(record) => {
                    info!(request = request.0, len = record.text.len(), "Extraction succeeded");
                    state.latest = Some(record.clone());
                    state.history.push(record);
                    state.notice = Some(Notice::success("Text extracted"));
                }
                Err(error) => {
                    warn!(request = request.0, error = %error, "Extraction failed");
                    if error == ExtractionError::MissingCredential {
                        state.credential_missing = true;
                    }
                    state.notice = Some(Notice::error(error.user_message()));
                }
            }
            Vec::new()
        }
        Event::CopyText(target) => {
            let text = match &target {
                CopyTarget::Latest => state.latest.as_ref().map(|r| r.text.clone()),
                CopyTarget::Record(id) => state.history.get(id).map(|r| r.text.clone()),
            };
            match text {
                Some(text) => {
                    state.notice = Some(Notice::info("Copied to clipboard"));
                    vec![Effect::CopyToClipboard(text)]
                }
                None => {
                    state.notice = Some(Notice::error("Nothing to copy"));
                    Vec::new()
                }
            }
        }
        Event::DeleteRecord(id) => {
            if state.history.remove(&id).is_none() {
                debug!(id = %id, "Delete ignored: no such record");
            }
            Vec::new()
        }
        Event::ClearHistory => {
            state.history.clear();
            Vec::new()
        }
        Event::DismissNotice => {
            state.notice = None;
            Vec::new()
        }
        Event::CloseResult => {
            state.latest = None;
            Vec::new()
        }
        Event::SetCredential(key) => {
            let key = key.trim().to_string();
            state.credential_missing = key.is_empty();
            if state.credential_missing {
                state.notice = Some(Notice::error(SETUP_PROMPT));
            } else {
                state.notice = Some(Notice::success("API key saved"));
            }
            vec![Effect::StoreCredential(key)]
        }
    }
}

fn request_capture(state: &mut AppState, frame: Option<(u32, u32)>) -> Vec<Effect> {
    if let Some(request) = state.in_flight {
        debug!(request = request.0, "Capture ignored: extraction in flight");
        return Vec::new();
    }
    if state.camera_error.is_some() || !state.camera_live {
        debug!("Capture ignored: camera not running");
        return Vec::new();
    }
    if state.credential_missing {
        state.notice = Some(Notice::error(SETUP_PROMPT));
        return Vec::new();
    }

    let container = (state.container.width, state.container.height);
    let Some(crop) = frame.and_then(|f| mapper::map_crop(f, container, &state.crop.rect())) else {
        debug!("Capture aborted: frame not ready");
        return Vec::new();
    };

    let request = state.allocate_request();
    state.in_flight = Some(request);
    info!(request = request.0, "Capture started");
    vec![Effect::Extract { request, crop }]
}

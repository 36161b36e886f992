//! Executes reducer effects against the camera, clipboard and text extractor.
//!
//! Everything runs on one thread. The extraction future is spawned on the current tokio runtime
//! and reports back through the results channel; the event loop feeds that result into
//! [`Runtime::dispatch`] like any other event.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::state::{reduce, AppState, Effect, Event, RequestId};
use crate::camera::{CameraRequest, CameraSource};
use crate::capture;
use crate::config;
use crate::extraction::{ExtractionError, ExtractionRequest, TextExtractor};
use crate::history::ExtractionRecord;
use crate::mapper::SourceCrop;
use crate::system::ClipboardSink;

/// Settings the runtime needs beyond the reducer state.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub credential: Option<String>,
    pub camera_request: CameraRequest,
    pub jpeg_quality: u8,
    /// Write credential changes back to the config file.
    pub persist_credential: bool,
}

pub struct Runtime<C, K> {
    state: AppState,
    camera: C,
    clipboard: K,
    extractor: Arc<dyn TextExtractor>,
    settings: RuntimeSettings,
    results: mpsc::UnboundedSender<Event>,
}

impl<C: CameraSource, K: ClipboardSink> Runtime<C, K> {
    pub fn new(
        state: AppState,
        camera: C,
        clipboard: K,
        extractor: Arc<dyn TextExtractor>,
        settings: RuntimeSettings,
        results: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            state,
            camera,
            clipboard,
            extractor,
            settings,
            results,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Acquires the camera for the first time.
    pub fn start(&mut self) {
        self.dispatch(Event::VisibilityChanged(true));
    }

    /// Capture trigger: samples the current frame size, then lets the reducer decide.
    pub fn capture(&mut self) {
        let frame = self.camera.frame().map(|f| (f.width(), f.height()));
        self.dispatch(Event::CaptureRequested { frame });
    }

    /// Runs `event` through the reducer and executes the resulting effects. Effects that
    /// complete synchronously feed their outcome back in before this returns.
    pub fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in reduce(&mut self.state, event) {
                if let Some(follow_up) = self.execute(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AcquireCamera => {
                self.camera.stop();
                match self.camera.acquire(&self.settings.camera_request) {
                    Ok(stream) => Some(Event::CameraReady { zoom: stream.zoom }),
                    Err(error) => Some(Event::CameraFailed(error)),
                }
            }
            Effect::StopCamera => {
                self.camera.stop();
                None
            }
            Effect::SetZoom(level) => match self.camera.set_zoom(level) {
                Ok(applied) => Some(Event::ZoomApplied(applied)),
                Err(error) => {
                    warn!(error = %error, "Zoom request failed");
                    None
                }
            },
            Effect::Extract { request, crop } => self.start_extraction(request, crop),
            Effect::CopyToClipboard(text) => {
                if let Err(error) = self.clipboard.copy_text(&text) {
                    warn!(error = %error, "Clipboard write failed");
                }
                None
            }
            Effect::StoreCredential(key) => {
                self.settings.credential = Some(key.clone()).filter(|k| !k.is_empty());
                if self.settings.persist_credential {
                    if let Err(error) = config::save_api_key(&key) {
                        warn!(error = %error, "Failed to persist API key");
                    }
                }
                None
            }
        }
    }

    /// Copies the region and spawns the extraction. Failures before the spawn resolve the
    /// request immediately.
    fn start_extraction(&mut self, request: RequestId, crop: SourceCrop) -> Option<Event> {
        let Some(frame) = self.camera.frame() else {
            return Some(Event::ExtractionFinished {
                request,
                result: Err(ExtractionError::Image("no frame available".to_string())),
            });
        };

        let image = match capture::capture_region(&frame, &crop, self.settings.jpeg_quality) {
            Ok(image) => image,
            Err(error) => {
                warn!(error = %error, "Capture failed");
                return Some(Event::ExtractionFinished {
                    request,
                    result: Err(ExtractionError::Image(error.to_string())),
                });
            }
        };

        let preview = image.data_url();
        let extraction = self.extractor.extract(ExtractionRequest {
            image,
            credential: self.settings.credential.clone().unwrap_or_default(),
        });
        let results = self.results.clone();
        info!(request = request.0, "Extraction request spawned");

        tokio::spawn(async move {
            let result = extraction
                .await
                .map(|text| ExtractionRecord::new(text, preview));
            if results
                .send(Event::ExtractionFinished { request, result })
                .is_err()
            {
                debug!(request = request.0, "Event loop gone, extraction result dropped");
            }
        });
        None
    }
}

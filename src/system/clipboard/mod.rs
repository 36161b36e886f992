//! Clipboard writes for extracted text.
//!
//! Fire-and-forget from the application's point of view: failures are logged by the caller and
//! never surface as state changes.

use arboard::Clipboard;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),
}

pub trait ClipboardSink {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard through `arboard`.
///
/// The handle is opened lazily and kept for the life of the process: on X11 and Wayland the
/// copied text is served by its owner, so dropping the handle right after `set_text` would
/// clear it again.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("open", &self.handle.is_some())
            .finish()
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = match self.handle.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        let clipboard = self.handle.insert(clipboard);
        // Only the length is logged; extracted text may be sensitive.
        clipboard.set_text(text.to_owned())?;
        debug!(chars = text.chars().count(), "Copied text to clipboard");
        Ok(())
    }
}

//! System interactions (clipboard).

mod clipboard;

pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};

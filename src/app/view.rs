//! Plain-text rendering of the application state.

use std::fmt::Write;

use super::state::{AppState, NoticeKind, Status, SETUP_PROMPT};
use crate::history::History;

const PREVIEW_CHARS: usize = 48;

pub fn render(state: &AppState) -> String {
    let mut out = String::new();

    match state.status() {
        Status::Idle if state.camera_live => {
            let _ = writeln!(out, "Ready");
        }
        Status::Idle => {
            let _ = writeln!(out, "Camera stopped");
        }
        Status::Processing { .. } => {
            let _ = writeln!(out, "Extracting text...");
        }
        Status::Error { message } => {
            let _ = writeln!(out, "Camera error: {message} Type `retry` to try again.");
        }
    }

    let rect = state.crop.rect();
    let _ = writeln!(
        out,
        "Crop: top {:.1}% left {:.1}% width {:.1}% height {:.1}%",
        rect.top, rect.left, rect.width, rect.height
    );
    if let Some(zoom) = state.zoom {
        let _ = writeln!(
            out,
            "Zoom: {:.2}x ({:.1}-{:.1})",
            zoom.current, zoom.min, zoom.max
        );
    }
    if state.credential_missing {
        let _ = writeln!(out, "{SETUP_PROMPT} Type `key <API_KEY>`.");
    }
    if let Some(notice) = &state.notice {
        let marker = match notice.kind {
            NoticeKind::Info => "i",
            NoticeKind::Success => "ok",
            NoticeKind::Error => "!",
        };
        let _ = writeln!(out, "[{marker}] {}", notice.message);
    }
    if let Some(latest) = &state.latest {
        let _ = writeln!(out, "--- {} ---", latest.id);
        let _ = writeln!(out, "{}", latest.text);
        let _ = writeln!(out, "---");
    }
    let _ = write!(out, "History: {} item(s)", state.history.len());
    out
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}

pub fn render_history(history: &History) -> String {
    if history.is_empty() {
        return "History is empty".to_string();
    }
    let mut out = String::new();
    for record in history.iter() {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            preview(&record.text)
        );
    }
    out.trim_end().to_string()
}

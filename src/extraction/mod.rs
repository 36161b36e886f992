//! Text extraction through a cloud vision-language model.
//!
//! A request is one encoded still frame plus the credential; the instruction is fixed. There is
//! no retry here: every failure is classified once and reported to the orchestration layer,
//! which turns it into a notice.

mod gemini;

pub use gemini::{GeminiExtractor, DEFAULT_BASE_URL, DEFAULT_MODEL};

use base64::prelude::*;
use futures_util::future::BoxFuture;
use thiserror::Error;

/// Instruction sent with every image.
pub const EXTRACTION_PROMPT: &str = "Extract all visible text from this image. \
Preserve the original layout and line breaks. \
Return only the extracted text, without any commentary, explanation or formatting.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("API key is not configured")]
    MissingCredential,
    #[error("API key was rejected")]
    InvalidCredential,
    #[error("Permission denied by the model provider")]
    PermissionDenied,
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Rate limited by the model provider")]
    RateLimited,
    #[error("Model returned no text")]
    EmptyResult,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Image preparation failed: {0}")]
    Image(String),
    #[error("Extraction failed: {0}")]
    Unspecified(String),
}

impl ExtractionError {
    /// Message surfaced to the user as a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => "Add an API key to start extracting text.".to_string(),
            Self::InvalidCredential => "The API key is invalid. Check it and try again.".to_string(),
            Self::PermissionDenied => {
                "The API key does not have permission to use this model.".to_string()
            }
            Self::ModelUnavailable(_) => {
                "The vision model is unavailable right now. Try again later.".to_string()
            }
            Self::RateLimited => "Too many requests. Wait a moment and try again.".to_string(),
            Self::EmptyResult => {
                "No text found. Adjust the crop area or lighting and try again.".to_string()
            }
            Self::Transport(_) => {
                "Could not reach the text extraction service. Check your connection.".to_string()
            }
            Self::Image(_) => "Could not capture the selected area.".to_string(),
            Self::Unspecified(reason) => format!("Text extraction failed: {reason}"),
        }
    }
}

/// Encoded still frame ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl EncodedImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg",
        }
    }

    pub fn base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64())
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub image: EncodedImage,
    pub credential: String,
}

/// The external collaborator that turns an image into text.
///
/// The returned future owns everything it needs so it can be spawned and awaited independently
/// of the caller.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, request: ExtractionRequest) -> BoxFuture<'static, Result<String, ExtractionError>>;
}

/// Trims model output and unwraps a single surrounding code fence, which models add despite
/// being told not to. Blank output is an [`ExtractionError::EmptyResult`].
pub fn normalize_text(raw: &str) -> Result<String, ExtractionError> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(|inner| match inner.split_once('\n') {
            // First line is a language tag when it has no spaces.
            Some((tag, body)) if !tag.contains(' ') => body,
            _ => inner,
        })
        .unwrap_or(trimmed)
        .trim();

    if unfenced.is_empty() {
        Err(ExtractionError::EmptyResult)
    } else {
        Ok(unfenced.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_keeps_layout() {
        assert_eq!(
            normalize_text("  Line one\n  indented\n\n").unwrap(),
            "Line one\n  indented"
        );
    }

    #[test]
    fn test_normalize_unwraps_code_fence() {
        assert_eq!(normalize_text("```text\nHello\nWorld\n```").unwrap(), "Hello\nWorld");
        assert_eq!(normalize_text("```\nHello\n```").unwrap(), "Hello");
    }

    #[test]
    fn test_normalize_rejects_blank_output() {
        assert_eq!(normalize_text(" \n\t"), Err(ExtractionError::EmptyResult));
        assert_eq!(normalize_text("``````"), Err(ExtractionError::EmptyResult));
    }

    #[test]
    fn test_data_url_prefix() {
        let image = EncodedImage::jpeg(vec![0xff, 0xd8, 0xff]);
        assert_eq!(image.data_url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_every_error_has_a_message() {
        let errors = [
            ExtractionError::MissingCredential,
            ExtractionError::InvalidCredential,
            ExtractionError::PermissionDenied,
            ExtractionError::ModelUnavailable("gone".into()),
            ExtractionError::RateLimited,
            ExtractionError::EmptyResult,
            ExtractionError::Transport("timeout".into()),
            ExtractionError::Image("empty".into()),
            ExtractionError::Unspecified("boom".into()),
        ];
        for error in errors {
            assert!(!error.user_message().is_empty());
        }
    }
}

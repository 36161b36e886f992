//! Gemini `generateContent` client.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    normalize_text, EncodedImage, ExtractionError, ExtractionRequest, TextExtractor,
    EXTRACTION_PROMPT,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn build_request<'a>(image: &'a EncodedImage, prompt: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type,
                        data: image.base64(),
                    },
                },
                Part::Text { text: prompt },
            ],
        }],
    }
}

/// Pulls the text out of a successful response body.
fn parse_success(body: &str) -> Result<String, ExtractionError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Unspecified(format!("invalid response: {e}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractionError::Unspecified(format!("request blocked ({reason})")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::EmptyResult);
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r != "STOP") {
            debug!(finish_reason = %reason, "Candidate finished without text");
        }
        return Err(ExtractionError::EmptyResult);
    }
    normalize_text(&text)
}

/// Classifies a non-success HTTP response.
fn classify_failure(status: u16, body: &str) -> ExtractionError {
    let api = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .ok();
    let message = api
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let api_status = api.as_ref().map(|e| e.status.as_str()).unwrap_or("");

    match status {
        400 if message.contains("API key") || message.contains("API_KEY_INVALID") => {
            ExtractionError::InvalidCredential
        }
        401 => ExtractionError::InvalidCredential,
        403 => ExtractionError::PermissionDenied,
        404 | 503 => ExtractionError::ModelUnavailable(message),
        429 => ExtractionError::RateLimited,
        _ if api_status == "RESOURCE_EXHAUSTED" => ExtractionError::RateLimited,
        _ => ExtractionError::Unspecified(message),
    }
}

/// Vision model client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiExtractor {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl TextExtractor for GeminiExtractor {
    fn extract(
        &self,
        request: ExtractionRequest,
    ) -> BoxFuture<'static, Result<String, ExtractionError>> {
        let client = self.client.clone();
        let url = self.endpoint();
        let model = self.model.clone();

        async move {
            let credential = request.credential.trim();
            if credential.is_empty() {
                return Err(ExtractionError::MissingCredential);
            }

            info!(
                model = %model,
                image_bytes = request.image.bytes.len(),
                "Sending image for text extraction"
            );
            let body = build_request(&request.image, EXTRACTION_PROMPT);
            let response = client
                .post(&url)
                .header("x-goog-api-key", credential)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "Failed to reach the vision model");
                    ExtractionError::Transport(e.to_string())
                })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ExtractionError::Transport(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                let error = classify_failure(status.as_u16(), &body);
                warn!(status = status.as_u16(), error = %error, "Vision model returned an error");
                return Err(error);
            }

            let text = parse_success(&body)?;
            info!(len = text.len(), "Text extracted");
            Ok(text)
        }
        .boxed()
    }
}

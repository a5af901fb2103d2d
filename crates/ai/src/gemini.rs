//! Google Gemini `generateContent` client (blocking).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AiError;
use crate::generator::{GeneratedText, GenerationRequest, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// API credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    /// `None` waits indefinitely for the service.
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// Blocking client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        // reqwest's blocking client defaults to a 30s timeout; pass ours
        // through explicitly so `None` really means no timeout.
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

impl TextGenerator for GeminiClient {
    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()), err)]
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError> {
        if request.model.trim().is_empty() {
            return Err(AiError::InvalidInput("model cannot be empty".to_string()));
        }

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", self.config.api_key.expose())
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        debug!(status = status.as_u16(), bytes = text.len(), "gemini response received");

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        Ok(GeneratedText {
            text: extract_text(&text)?,
            model: request.model.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Pull the generated text out of a successful response body.
///
/// Text parts of the first candidate are concatenated. A response without
/// candidates (e.g. blocked prompt) or without any text part is an error.
fn extract_text(body: &str) -> Result<String, AiError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(AiError::EmptyResponse(reason));
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if texts.is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!("candidate has no `text` part (finish reason: {r})"))
            .unwrap_or_else(|| "candidate has no `text` part".to_string());
        return Err(AiError::MalformedResponse(reason));
    }

    Ok(texts.concat())
}

fn classify_error(status: StatusCode, body: &str) -> AiError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());

    let key_rejected = parsed.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    if key_rejected || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AiError::Authentication(message);
    }

    AiError::Api {
        status: status.as_u16(),
        message,
    }
}

use std::sync::Mutex;

use crate::error::AiError;

/// One-shot text generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Model identifier understood by the service (e.g. "gemini-1.5-flash").
    pub model: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// Text returned by the service, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub model: String,
}

/// Synchronous generative text service.
///
/// Implementations block the calling thread for the full round trip.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError>;
}

impl<G> TextGenerator for std::sync::Arc<G>
where
    G: TextGenerator + ?Sized,
{
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError> {
        (**self).generate(request)
    }
}

/// In-process generator for tests/dev: answers every request with a fixed
/// reply (or a fixed failure) and records what it was asked.
#[derive(Debug)]
pub struct RecordingTextGenerator {
    reply: Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingTextGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with [`AiError::Api`] carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

impl TextGenerator for RecordingTextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        match &self.reply {
            Ok(text) => Ok(GeneratedText {
                text: text.clone(),
                model: request.model.clone(),
            }),
            Err(message) => Err(AiError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

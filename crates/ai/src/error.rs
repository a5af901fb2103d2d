use thiserror::Error;

/// Failure of a generative text call.
///
/// None of these are retried; they propagate to whoever triggered the call.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication rejected by text service: {0}")]
    Authentication(String),

    #[error("text service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no text generated: {0}")]
    EmptyResponse(String),
}

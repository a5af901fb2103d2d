//! `carlot-ai`
//!
//! **Responsibility:** generative text boundary.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on inventory types (callers pass plain strings).
//! - It must not touch storage.
//! - Calls are synchronous and blocking; no retry, no fallback.

pub mod error;
pub mod gemini;
pub mod generator;
pub mod prompt;

pub use error::AiError;
pub use gemini::{ApiKey, GeminiClient, GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use generator::{GeneratedText, GenerationRequest, RecordingTextGenerator, TextGenerator};
pub use prompt::{BioPromptTemplate, CarBioPrompt, DEFAULT_BIO_TEMPLATE, MAX_BIO_CHARS};

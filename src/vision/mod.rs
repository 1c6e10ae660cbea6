//! Recognition-service boundary.
//!
//! The pipeline hands normalized image bytes to an external
//! image-understanding backend and gets back either a flat recognized-text
//! string (plain-text backends) or a JSON document matching the extraction
//! schema (structured backends). Credentials come from process-wide
//! configuration; a missing credential is a hard failure for the request.

mod gemini;
mod google;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{RecognitionProvider, RecognitionSettings};

pub use gemini::GeminiBackend;
pub use google::GoogleVisionBackend;

/// What shape of output a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionKind {
    /// Flat recognized text, fed to the pattern-rule extractor.
    PlainText,
    /// JSON matching the extraction schema, fed to the structured extractor.
    Structured,
}

/// Errors from the recognition service call.
///
/// All variants are unrecoverable for the current request and route the
/// pipeline to its degraded fallback; none are retried automatically.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition credential missing: {0}")]
    MissingCredential(&'static str),

    #[error("recognition transport failure: {0}")]
    Transport(String),

    #[error("recognition service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("recognition service returned an empty response")]
    EmptyResponse,
}

/// An external image-to-text or image-to-JSON backend.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Output shape, used to pick the matching extraction strategy.
    fn kind(&self) -> RecognitionKind;

    /// Whether the backend can run (credential present).
    fn is_available(&self) -> bool;

    /// Run recognition on one image, returning the raw response body text.
    async fn recognize(&self, image: &[u8], mime_type: &str)
        -> Result<String, RecognitionError>;
}

/// Build the configured backend.
pub fn backend_for(settings: &RecognitionSettings) -> Arc<dyn RecognitionBackend> {
    match settings.provider {
        RecognitionProvider::Vision => Arc::new(GoogleVisionBackend::new(settings)),
        RecognitionProvider::Gemini => Arc::new(GeminiBackend::new(settings)),
    }
}

/// Map a reqwest failure into a transport error.
pub(crate) fn transport_err(err: reqwest::Error) -> RecognitionError {
    RecognitionError::Transport(err.to_string())
}

/// Reject blank recognition output.
pub(crate) fn non_empty(text: String) -> Result<String, RecognitionError> {
    if text.trim().is_empty() {
        Err(RecognitionError::EmptyResponse)
    } else {
        Ok(text)
    }
}

//! Google Cloud Vision text-detection backend.
//!
//! Sends the image through `images:annotate` with a `TEXT_DETECTION`
//! feature request and returns the first full-text annotation. Requires
//! `VISION_API_KEY` (or an explicit key in settings).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{non_empty, transport_err, RecognitionBackend, RecognitionError, RecognitionKind};
use crate::config::RecognitionSettings;

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Vision OCR backend producing flat recognized text.
pub struct GoogleVisionBackend {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateEntry>,
}

#[derive(Debug, Serialize)]
struct AnnotateEntry {
    image: AnnotateImage,
    features: Vec<AnnotateFeature>,
}

#[derive(Debug, Serialize)]
struct AnnotateImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnnotateFeature {
    #[serde(rename = "type")]
    feature_type: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Option<Vec<AnnotateResult>>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResult {
    #[serde(rename = "textAnnotations")]
    text_annotations: Option<Vec<TextAnnotation>>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: Option<String>,
}

impl GoogleVisionBackend {
    /// Create a backend from recognition settings.
    pub fn new(settings: &RecognitionSettings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override the API endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl RecognitionBackend for GoogleVisionBackend {
    fn kind(&self) -> RecognitionKind {
        RecognitionKind::PlainText
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn recognize(
        &self,
        image: &[u8],
        _mime_type: &str,
    ) -> Result<String, RecognitionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(RecognitionError::MissingCredential("VISION_API_KEY"))?;

        let request = AnnotateRequest {
            requests: vec![AnnotateEntry {
                image: AnnotateImage {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![AnnotateFeature {
                    feature_type: "TEXT_DETECTION",
                    max_results: 1,
                }],
            }],
        };

        let url = format!("{}?key={}", self.endpoint, api_key);
        debug!(bytes = image.len(), "calling Vision text detection");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(transport_err)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Api { status, body });
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Transport(format!("malformed response body: {e}")))?;

        let text = annotate
            .responses
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.text_annotations)
            .and_then(|a| a.into_iter().next())
            .and_then(|a| a.description)
            .ok_or(RecognitionError::EmptyResponse)?;

        non_empty(text)
    }
}

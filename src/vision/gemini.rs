//! Gemini vision backend for structured receipt extraction.
//!
//! Prompts a vision-capable Gemini model with the extraction schema and
//! returns the candidate text, which is expected to be a JSON document.
//! Requires `GEMINI_API_KEY` (or an explicit key in settings).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{non_empty, transport_err, RecognitionBackend, RecognitionError, RecognitionKind};
use crate::config::RecognitionSettings;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Extraction prompt sent with every receipt image.
///
/// The numeric-reading rules matter: Korean receipts price goods at a
/// ten-won granularity, so per-item and per-discount amounts end in a zero
/// digit, while tax figures may not. `finalAmount` is defined as
/// `totalAmount - totalDiscount` and can legitimately differ from
/// `taxableSales + vat` when non-taxable items are present.
pub const RECEIPT_EXTRACTION_PROMPT: &str = r#"You are reading a photographed Korean retail or delivery receipt. Extract the transaction into a single JSON object with exactly these fields (use "" for missing strings, 0 for missing numbers, [] for missing arrays):

{
  "storeName": string,            // brand or store name as printed
  "orderNumber": string,          // 14-digit order number if present
  "orderType": string,            // e.g. "배달", "픽업", "방문"
  "customerServicePhone": string,
  "riderCustomerService": string,
  "customerAddress": string,
  "items": [{"name": string, "productCode": string or null, "category": string or null, "quantity": number, "price": number}],
  "discounts": [{"name": string, "amount": number}],
  "totalAmount": number,          // pre-discount total
  "totalDiscount": number or null,
  "finalAmount": number or null,  // amount actually paid
  "taxableSales": number,
  "vat": number,
  "customerRequest": string,
  "riderRequest": string,
  "cardNumber": string,           // masked, as printed
  "loyaltyPointsBasic": number,
  "loyaltyPointsAccumulated": number,
  "orderReceiptTime": string      // as printed on the receipt
}

Number-reading rules:
- "price" is the per-unit price in won, with no thousands separators.
- Per-item prices and discount amounts end in a zero digit. If a digit you read makes an amount end in something else, re-read it.
- taxableSales and vat may end in any digit.
- finalAmount = totalAmount - totalDiscount. Do NOT compute it as taxableSales + vat; non-taxable items make those differ.

Return ONLY the JSON object, with no commentary and no markdown fences."#;

/// Gemini vision backend producing schema-shaped JSON.
pub struct GeminiBackend {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiBackend {
    /// Create a backend from recognition settings.
    pub fn new(settings: &RecognitionSettings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings.gemini_model.clone(),
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
impl RecognitionBackend for GeminiBackend {
    fn kind(&self) -> RecognitionKind {
        RecognitionKind::Structured
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn recognize(&self, image: &[u8], mime_type: &str) -> Result<String, RecognitionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(RecognitionError::MissingCredential("GEMINI_API_KEY"))?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: RECEIPT_EXTRACTION_PROMPT.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.1,
                max_output_tokens: 8192,
            },
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, api_key
        );
        debug!(bytes = image.len(), model = %self.model, "calling Gemini extraction");

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

        let gemini: GeminiResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Transport(format!("malformed response body: {e}")))?;

        if let Some(error) = gemini.error {
            return Err(RecognitionError::Api {
                status: 200,
                body: error.message,
            });
        }

        let text = gemini
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(RecognitionError::EmptyResponse)?;

        non_empty(text)
    }
}

//! Text/field extraction from recognition output.
//!
//! Two interchangeable strategies, selected by which recognition backend is
//! configured (never by inspecting the input at runtime):
//!
//! - [`PatternExtractor`] works on a flat recognized-text string. Every
//!   field is derived by an independent pure function over the text with
//!   ordered candidate patterns; a field that fails to match resolves to
//!   its documented default without affecting any other field, so this
//!   strategy never returns an error.
//! - [`StructuredExtractor`] works on the JSON document a vision model
//!   returns for the extraction-schema prompt. Absent fields read as safe
//!   defaults, but a response that is not valid JSON is a hard error: the
//!   caller discards everything and falls back to an all-default receipt
//!   rather than mixing model output with defaults.

mod category;
mod patterns;
mod structured;
mod timestamp;

use thiserror::Error;

use crate::config::ExtractionSettings;
use crate::models::{Discount, ReceiptItem};
use crate::vision::RecognitionKind;

pub use category::{infer_category, DEFAULT_CATEGORY};
pub use patterns::{PatternExtractor, GENERAL_ORDER_TYPE, NO_ADDRESS, NO_DATA, UNKNOWN_STORE};
pub use structured::StructuredExtractor;
pub use timestamp::{normalize_order_time, now_canonical, CANONICAL_FORMAT};

/// Field set produced by an extraction strategy, before reconciliation.
///
/// Zero amounts mean "not extracted" for the labeled figures; the
/// reconciler decides what is authoritative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedReceipt {
    pub store_name: String,
    pub order_number: String,
    pub order_type: String,
    pub customer_service_phone: String,
    pub rider_customer_service: String,
    pub customer_address: String,
    pub items: Vec<ReceiptItem>,
    pub discounts: Vec<Discount>,
    pub total_amount: i64,
    pub total_discount: Option<i64>,
    pub final_amount: Option<i64>,
    pub taxable_sales: i64,
    pub vat: i64,
    pub customer_request: String,
    pub rider_request: String,
    pub card_number: String,
    pub loyalty_points_basic: i64,
    pub loyalty_points_accumulated: i64,
    /// Already normalized to canonical `YYYY.MM.DD HH:mm:ss` form.
    pub order_receipt_time: String,
}

/// Errors from extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("structured response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// An extraction strategy over raw recognition output.
pub trait ReceiptExtractor: Send + Sync {
    fn extract(&self, raw: &str) -> Result<ExtractedReceipt, ExtractError>;
}

/// Pick the extraction strategy matching the backend's output shape.
pub fn for_kind(kind: RecognitionKind, settings: &ExtractionSettings) -> Box<dyn ReceiptExtractor> {
    match kind {
        RecognitionKind::PlainText => Box::new(PatternExtractor::new(settings.clone())),
        RecognitionKind::Structured => Box::new(StructuredExtractor::new()),
    }
}

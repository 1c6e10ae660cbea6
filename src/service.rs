//! Receipt analysis pipeline.
//!
//! Wires the components together for one image-analysis request:
//! normalize, recognize, extract, reconcile, assemble. Each call is pure
//! given its input bytes and process-wide configuration; concurrent
//! analyses need no coordination. The pipeline never raises past its own
//! boundary for recoverable conditions: configuration, transport, and
//! parse failures are logged and produce a degraded-but-valid receipt.

use std::sync::Arc;

use tracing::{error, info};

use crate::assemble::Assembler;
use crate::config::Settings;
use crate::extract::{self, ReceiptExtractor};
use crate::models::Receipt;
use crate::normalize::ImageNormalizer;
use crate::reconcile;
use crate::vision::{self, RecognitionBackend};

/// One-stop service for analyzing uploaded receipt images.
pub struct AnalysisService {
    normalizer: ImageNormalizer,
    backend: Arc<dyn RecognitionBackend>,
    extractor: Box<dyn ReceiptExtractor>,
    assembler: Assembler,
}

impl AnalysisService {
    /// Build the service with the configured recognition backend.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_backend(vision::backend_for(&settings.recognition), settings)
    }

    /// Build the service around an explicit backend (tests inject mocks
    /// here). The extraction strategy always follows the backend's output
    /// shape, never the runtime shape of a response.
    pub fn with_backend(backend: Arc<dyn RecognitionBackend>, settings: &Settings) -> Self {
        let extractor = extract::for_kind(backend.kind(), &settings.extraction);
        Self {
            normalizer: ImageNormalizer::new(settings.normalize.clone()),
            backend,
            extractor,
            assembler: Assembler::new(settings.normalize.max_embedded_bytes),
        }
    }

    /// Analyze one uploaded receipt image.
    ///
    /// Always returns a receipt. Recognition or parse failures yield the
    /// degraded all-default record with the upload still attached; callers
    /// that care about degradation watch the error logs at this boundary.
    pub async fn process_receipt_image(
        &self,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> Receipt {
        let image = self.normalizer.normalize(bytes, declared_mime);

        let raw = match self.backend.recognize(&image.bytes, &image.mime_type).await {
            Ok(raw) => raw,
            Err(err) => {
                error!("recognition failed: {err}");
                return self.assembler.degraded(&image);
            }
        };

        let extracted = match self.extractor.extract(&raw) {
            Ok(extracted) => extracted,
            Err(err) => {
                error!("extraction failed, discarding response: {err}");
                return self.assembler.degraded(&image);
            }
        };

        let totals = reconcile::reconcile(&extracted);
        let receipt = self.assembler.assemble(extracted, totals, &image);
        info!(
            store = %receipt.store_name,
            items = receipt.items.len(),
            total = receipt.total_amount,
            "analyzed receipt"
        );
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{RecognitionError, RecognitionKind};
    use async_trait::async_trait;

    struct ScriptedBackend {
        kind: RecognitionKind,
        response: Result<String, ()>,
    }

    #[async_trait]
    impl RecognitionBackend for ScriptedBackend {
        fn kind(&self) -> RecognitionKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn recognize(&self, _: &[u8], _: &str) -> Result<String, RecognitionError> {
            self.response
                .clone()
                .map_err(|_| RecognitionError::Transport("connection reset".to_string()))
        }
    }

    fn service(kind: RecognitionKind, response: Result<String, ()>) -> AnalysisService {
        AnalysisService::with_backend(
            Arc::new(ScriptedBackend { kind, response }),
            &Settings::default(),
        )
    }

    #[tokio::test]
    async fn test_transport_failure_degrades() {
        let service = service(RecognitionKind::PlainText, Err(()));
        let receipt = service.process_receipt_image(b"fake image", None).await;

        assert!(receipt.items.is_empty());
        assert_eq!(receipt.total_amount, 0);
        assert_eq!(receipt.total_quantity, 0);
        assert!(!receipt.image_url.is_empty());
    }

    #[tokio::test]
    async fn test_pattern_pipeline_end_to_end() {
        let text = "GS25\n포장봉투 1개 200원\n합계 금액: 12,900원".to_string();
        let service = service(RecognitionKind::PlainText, Ok(text));
        let receipt = service.process_receipt_image(b"fake image", None).await;

        assert_eq!(receipt.store_name, "GS25");
        assert_eq!(receipt.total_amount, 12900);
        assert!(!receipt.items.is_empty());
    }

    #[tokio::test]
    async fn test_structured_parse_failure_discards_fields() {
        let service = service(
            RecognitionKind::Structured,
            Ok("this is not json, storeName: GS25".to_string()),
        );
        let receipt = service.process_receipt_image(b"fake image", None).await;

        // Nothing from the unparseable response leaks into the record.
        assert_eq!(receipt.store_name, "");
        assert!(receipt.items.is_empty());
        assert!(!receipt.image_url.is_empty());
    }
}

//! End-to-end pipeline tests with a scripted recognition backend.

use std::sync::Arc;

use async_trait::async_trait;

use receiptbook::config::Settings;
use receiptbook::repository::{JsonReceiptRepository, ReceiptRepository};
use receiptbook::service::AnalysisService;
use receiptbook::vision::{RecognitionBackend, RecognitionError, RecognitionKind};

/// Backend that replays a canned response instead of calling a network.
struct ScriptedBackend {
    kind: RecognitionKind,
    response: Result<String, String>,
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
            .map_err(RecognitionError::Transport)
    }
}

fn plain_text_service(text: &str) -> AnalysisService {
    AnalysisService::with_backend(
        Arc::new(ScriptedBackend {
            kind: RecognitionKind::PlainText,
            response: Ok(text.to_string()),
        }),
        &Settings::default(),
    )
}

fn structured_service(json: &str) -> AnalysisService {
    AnalysisService::with_backend(
        Arc::new(ScriptedBackend {
            kind: RecognitionKind::Structured,
            response: Ok(json.to_string()),
        }),
        &Settings::default(),
    )
}

const SAMPLE_TEXT: &str = "GS25 안산와동점\n\
    우리동네 배달\n\
    포장봉투 1개 200원\n\
    농심 닭다리66G 1개 1,700원\n\
    합계 금액: 12,900원\n\
    주문접수시간: 25/09/01 20:04:44";

#[tokio::test]
async fn recognition_failure_yields_degraded_receipt() {
    let service = AnalysisService::with_backend(
        Arc::new(ScriptedBackend {
            kind: RecognitionKind::PlainText,
            response: Err("connection refused".to_string()),
        }),
        &Settings::default(),
    );

    let receipt = service.process_receipt_image(b"photo bytes", None).await;

    assert!(receipt.items.is_empty());
    assert_eq!(receipt.total_amount, 0);
    assert_eq!(receipt.total_quantity, 0);
    assert!(!receipt.image_url.is_empty());
}

#[tokio::test]
async fn sample_text_extracts_labeled_total_and_items() {
    let receipt = plain_text_service(SAMPLE_TEXT)
        .process_receipt_image(b"photo bytes", None)
        .await;

    assert_eq!(receipt.total_amount, 12900);
    assert!(receipt.items.len() >= 2);
    assert_eq!(receipt.items[0].price, 200);
    assert_eq!(receipt.items[1].price, 1700);
    assert_eq!(receipt.order_receipt_time, "2025.09.01 20:04:44");
    assert_eq!(receipt.store_name, "GS25");
    assert_eq!(receipt.order_type, "배달");
    // No labeled tax figures: derived from the labeled total.
    assert_eq!(receipt.taxable_sales, 11727);
    assert_eq!(receipt.vat, 1173);
}

#[tokio::test]
async fn unknown_store_falls_back_to_sentinel() {
    let receipt = plain_text_service("영수증\n감사합니다")
        .process_receipt_image(b"photo bytes", None)
        .await;
    assert_eq!(receipt.store_name, "기타 상점");
}

#[tokio::test]
async fn item_sum_stands_in_for_missing_total() {
    let receipt = plain_text_service("동네마트\n콜라 2개 1,200원\n빵 1개 3,000원")
        .process_receipt_image(b"photo bytes", None)
        .await;

    assert_eq!(
        receipt.total_amount,
        receipt
            .items
            .iter()
            .map(|i| i.price * i64::from(i.quantity))
            .sum::<i64>()
    );
    assert_eq!(receipt.total_quantity, receipt.computed_quantity());
}

#[tokio::test]
async fn structured_response_resolves_discounts() {
    let receipt = structured_service(
        r#"{
            "storeName": "GS25",
            "items": [
                {"name": "포장봉투", "quantity": 1, "price": 200},
                {"name": "농심) 닭다리66G", "quantity": 1, "price": 1700}
            ],
            "discounts": [
                {"name": "LG U+할인", "amount": 1000},
                {"name": "APP전용할인", "amount": 500}
            ],
            "totalAmount": 12900,
            "orderReceiptTime": "2025-09-01 20:04:44"
        }"#,
    )
    .process_receipt_image(b"photo bytes", None)
    .await;

    // totalDiscount absent: it is the sum of the entries.
    assert_eq!(receipt.total_discount, Some(1500));
    assert_eq!(receipt.final_amount, 12900 - 1500);
    assert_eq!(receipt.discounts.as_ref().map(Vec::len), Some(2));
    assert_eq!(receipt.order_receipt_time, "2025.09.01 20:04:44");
}

#[tokio::test]
async fn structured_parse_failure_discards_partial_fields() {
    let receipt = structured_service("Sorry, I could not read the receipt.")
        .process_receipt_image(b"photo bytes", None)
        .await;

    assert_eq!(receipt.store_name, "");
    assert!(receipt.items.is_empty());
    assert_eq!(receipt.total_amount, 0);
    assert!(!receipt.image_url.is_empty());
}

#[tokio::test]
async fn analyzed_receipt_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonReceiptRepository::open(dir.path()).unwrap();

    let receipt = plain_text_service(SAMPLE_TEXT)
        .process_receipt_image(b"photo bytes", None)
        .await;
    let analysis_id = receipt.id.clone();

    let stored = repo.create(receipt).await.unwrap();
    // The store owns identity.
    assert_ne!(stored.id, analysis_id);

    let fetched = repo.get(&stored.id).await.unwrap().unwrap();
    assert_eq!(fetched.total_amount, 12900);
    assert_eq!(fetched.order_receipt_time, "2025.09.01 20:04:44");

    let listed = repo.list().await.unwrap();
    assert_eq!(listed.len(), 1);
}

//! Receipt assembly.
//!
//! Merges the extracted field set and reconciled totals into a complete
//! `Receipt`, generates the request-scoped identifiers, embeds the
//! normalized image, and stamps creation times. Also builds the degraded
//! all-default receipt returned when recognition or parsing fails; that
//! record still carries the uploaded image so the caller's "always get a
//! receipt back" contract holds.

use base64::Engine;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::extract::ExtractedReceipt;
use crate::models::Receipt;
use crate::normalize::NormalizedImage;
use crate::reconcile::ReconciledTotals;

/// Builds complete `Receipt` records from pipeline output.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Maximum base64 payload length embedded into `imageUrl`.
    max_embedded_bytes: usize,
}

impl Assembler {
    pub fn new(max_embedded_bytes: usize) -> Self {
        Self { max_embedded_bytes }
    }

    /// Combine extracted fields and reconciled totals into a full record.
    pub fn assemble(
        &self,
        extracted: ExtractedReceipt,
        totals: ReconciledTotals,
        image: &NormalizedImage,
    ) -> Receipt {
        let now = Utc::now();
        let millis = now.timestamp_millis().to_string();

        Receipt {
            id: Uuid::new_v4().to_string(),
            store_name: extracted.store_name,
            transaction_id: format!("TXN{millis}"),
            order_number: extracted.order_number,
            order_type: extracted.order_type,
            customer_service_phone: extracted.customer_service_phone,
            rider_customer_service: extracted.rider_customer_service,
            customer_safety_number: format!("SAFE{}", &millis[millis.len().saturating_sub(6)..]),
            customer_address: extracted.customer_address,
            items: extracted.items,
            total_quantity: totals.total_quantity,
            total_amount: totals.total_amount,
            discounts: if extracted.discounts.is_empty() {
                None
            } else {
                Some(extracted.discounts)
            },
            total_discount: totals.total_discount,
            final_amount: totals.final_amount,
            taxable_sales: totals.taxable_sales,
            vat: totals.vat,
            customer_request: extracted.customer_request,
            rider_request: extracted.rider_request,
            card_number: extracted.card_number,
            loyalty_points_basic: extracted.loyalty_points_basic,
            loyalty_points_accumulated: extracted.loyalty_points_accumulated,
            order_receipt_time: extracted.order_receipt_time,
            image_url: self.image_payload(image),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// All-default receipt for failed analyses, image still attached.
    pub fn degraded(&self, image: &NormalizedImage) -> Receipt {
        let mut receipt = Receipt::empty();
        receipt.id = Uuid::new_v4().to_string();
        receipt.image_url = self.image_payload(image);
        let now = Utc::now();
        receipt.created_at = Some(now);
        receipt.updated_at = Some(now);
        receipt
    }

    /// Encode the image as a data URL, unless it exceeds the embed cap.
    fn image_payload(&self, image: &NormalizedImage) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        if payload.len() > self.max_embedded_bytes {
            warn!(
                payload_len = payload.len(),
                cap = self.max_embedded_bytes,
                "image payload exceeds embed cap, storing without image"
            );
            return String::new();
        }
        format!("data:{};base64,{}", image.mime_type, payload)
    }
}

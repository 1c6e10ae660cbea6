//! Receipt models for analyzed delivery and retail transactions.
//!
//! A `Receipt` is assembled once per image-analysis request and is never
//! mutated by the analysis pipeline itself. The persistence layer assigns
//! the final identifier and timestamps on create; edits downstream replace
//! the whole record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One purchased product entry within a receipt.
///
/// `price` is the per-unit amount in KRW (no minor units), so an item
/// contributes `price * quantity` to the receipt total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    /// Numeric barcode, when the recognition backend can read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    /// Keyword-inferred category (e.g. "스낵", "음료"); "기타" when nothing matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: u32,
    pub price: i64,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: i64) -> Self {
        Self {
            name: name.into(),
            product_code: None,
            category: None,
            quantity,
            price,
        }
    }

    /// Amount this line contributes to the pre-discount total.
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// A named deduction applied to the pre-discount total
/// (e.g. "LG U+할인", "APP전용할인").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub name: String,
    pub amount: i64,
}

/// The canonical structured record of one delivery/retail transaction.
///
/// Every required field is populated at assembly time; a degraded record
/// (produced when recognition fails) carries the documented defaults but is
/// still structurally complete, so consumers never see a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Request-scoped identifier; reassigned by the persistence layer on create.
    pub id: String,
    pub store_name: String,
    pub transaction_id: String,
    pub order_number: String,
    pub order_type: String,
    pub customer_service_phone: String,
    pub rider_customer_service: String,
    pub customer_safety_number: String,
    pub customer_address: String,
    pub items: Vec<ReceiptItem>,
    pub total_quantity: u32,
    /// Pre-discount total in KRW.
    pub total_amount: i64,
    /// Ordered discount entries; absent when the receipt carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounts: Option<Vec<Discount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_discount: Option<i64>,
    /// Amount actually paid after discounts.
    pub final_amount: i64,
    pub taxable_sales: i64,
    pub vat: i64,
    pub customer_request: String,
    pub rider_request: String,
    /// Masked card number as printed (e.g. `0190-79**-****-7110`).
    pub card_number: String,
    pub loyalty_points_basic: i64,
    pub loyalty_points_accumulated: i64,
    /// Always in canonical `YYYY.MM.DD HH:mm:ss` form once assembled.
    pub order_receipt_time: String,
    /// Base64 data URL of the normalized upload, or an object-reference string.
    pub image_url: String,
    #[serde(
        default,
        rename = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "updated_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Receipt {
    /// A structurally complete receipt with every field at its documented
    /// default: empty strings, zero amounts, no items.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            store_name: String::new(),
            transaction_id: String::new(),
            order_number: String::new(),
            order_type: String::new(),
            customer_service_phone: String::new(),
            rider_customer_service: String::new(),
            customer_safety_number: String::new(),
            customer_address: String::new(),
            items: Vec::new(),
            total_quantity: 0,
            total_amount: 0,
            discounts: None,
            total_discount: None,
            final_amount: 0,
            taxable_sales: 0,
            vat: 0,
            customer_request: String::new(),
            rider_request: String::new(),
            card_number: String::new(),
            loyalty_points_basic: 0,
            loyalty_points_accumulated: 0,
            order_receipt_time: String::new(),
            image_url: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sum of item quantities.
    pub fn computed_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of `price * quantity` across items.
    pub fn computed_item_total(&self) -> i64 {
        self.items.iter().map(ReceiptItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = ReceiptItem::new("유어스) 돌덩이얼음1KG", 2, 2200);
        assert_eq!(item.line_total(), 4400);
    }

    #[test]
    fn test_empty_receipt_defaults() {
        let receipt = Receipt::empty();
        assert!(receipt.items.is_empty());
        assert_eq!(receipt.total_amount, 0);
        assert_eq!(receipt.total_quantity, 0);
        assert_eq!(receipt.store_name, "");
        assert!(receipt.discounts.is_none());
    }

    #[test]
    fn test_computed_sums() {
        let mut receipt = Receipt::empty();
        receipt.items = vec![
            ReceiptItem::new("포장봉투", 1, 200),
            ReceiptItem::new("농심) 닭다리66G", 1, 1700),
            ReceiptItem::new("유어스) 돌덩이얼음1KG", 2, 2200),
        ];
        assert_eq!(receipt.computed_quantity(), 4);
        assert_eq!(receipt.computed_item_total(), 6300);
    }

    #[test]
    fn test_wire_field_names() {
        let mut receipt = Receipt::empty();
        receipt.store_name = "GS25".to_string();
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("storeName").is_some());
        assert!(json.get("orderReceiptTime").is_some());
        // Timestamps stay snake_case in the stored document format.
        assert!(json.get("created_at").is_none());
        assert!(json.get("discounts").is_none());
    }
}

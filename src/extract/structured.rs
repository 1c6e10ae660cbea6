//! Structured-response extraction from vision-model JSON.
//!
//! The model is prompted with an explicit schema (see the Gemini backend),
//! so parsing is a straight serde read with a safe default for every absent
//! field. A body that is not valid JSON is a hard error; the pipeline then
//! discards everything from this response instead of mixing model output
//! with defaults.

use serde::Deserialize;

use super::category::infer_category;
use super::timestamp;
use super::{ExtractError, ExtractedReceipt, ReceiptExtractor};
use crate::models::{Discount, ReceiptItem};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StructuredResponse {
    store_name: String,
    order_number: String,
    order_type: String,
    customer_service_phone: String,
    rider_customer_service: String,
    customer_address: String,
    items: Vec<StructuredItem>,
    discounts: Vec<StructuredDiscount>,
    total_amount: i64,
    total_discount: Option<i64>,
    final_amount: Option<i64>,
    taxable_sales: i64,
    vat: i64,
    customer_request: String,
    rider_request: String,
    card_number: String,
    loyalty_points_basic: i64,
    loyalty_points_accumulated: i64,
    order_receipt_time: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StructuredItem {
    name: String,
    product_code: Option<String>,
    category: Option<String>,
    quantity: u32,
    price: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StructuredDiscount {
    name: String,
    amount: i64,
}

/// Models wrap JSON in markdown fences despite being told not to.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .trim_end_matches('`')
        .trim()
}

/// Drop empty-string stand-ins the model emits for missing values.
fn non_empty_opt(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Structured-response extraction strategy.
#[derive(Debug, Default)]
pub struct StructuredExtractor;

impl StructuredExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ReceiptExtractor for StructuredExtractor {
    fn extract(&self, raw: &str) -> Result<ExtractedReceipt, ExtractError> {
        let response: StructuredResponse = serde_json::from_str(strip_code_fences(raw))?;

        let items = response
            .items
            .into_iter()
            .map(|item| {
                let category = non_empty_opt(item.category)
                    .unwrap_or_else(|| infer_category(&item.name).to_string());
                ReceiptItem {
                    product_code: non_empty_opt(item.product_code),
                    category: Some(category),
                    name: item.name,
                    quantity: item.quantity,
                    price: item.price,
                }
            })
            .collect();

        let discounts = response
            .discounts
            .into_iter()
            .map(|d| Discount {
                name: d.name,
                amount: d.amount,
            })
            .collect();

        Ok(ExtractedReceipt {
            store_name: response.store_name,
            order_number: response.order_number,
            order_type: response.order_type,
            customer_service_phone: response.customer_service_phone,
            rider_customer_service: response.rider_customer_service,
            customer_address: response.customer_address,
            items,
            discounts,
            total_amount: response.total_amount,
            total_discount: response.total_discount,
            final_amount: response.final_amount,
            taxable_sales: response.taxable_sales,
            vat: response.vat,
            customer_request: response.customer_request,
            rider_request: response.rider_request,
            card_number: response.card_number,
            loyalty_points_basic: response.loyalty_points_basic,
            loyalty_points_accumulated: response.loyalty_points_accumulated,
            order_receipt_time: timestamp::normalize_order_time(&response.order_receipt_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> ExtractedReceipt {
        StructuredExtractor::new().extract(raw).unwrap()
    }

    #[test]
    fn test_full_response() {
        let extracted = extract(
            r#"{
                "storeName": "GS25",
                "orderNumber": "20250901112225",
                "orderType": "배달",
                "items": [
                    {"name": "포장봉투", "quantity": 1, "price": 200},
                    {"name": "농심) 닭다리66G", "productCode": "8801043036535",
                     "category": "스낵", "quantity": 1, "price": 1700}
                ],
                "discounts": [{"name": "LG U+할인", "amount": 1000}],
                "totalAmount": 12900,
                "totalDiscount": 1000,
                "finalAmount": 11900,
                "taxableSales": 11545,
                "vat": 1155,
                "orderReceiptTime": "25/09/01 20:04:44"
            }"#,
        );

        assert_eq!(extracted.store_name, "GS25");
        assert_eq!(extracted.items.len(), 2);
        assert_eq!(extracted.items[1].product_code.as_deref(), Some("8801043036535"));
        assert_eq!(extracted.items[1].category.as_deref(), Some("스낵"));
        assert_eq!(extracted.discounts.len(), 1);
        assert_eq!(extracted.total_discount, Some(1000));
        assert_eq!(extracted.final_amount, Some(11900));
        assert_eq!(extracted.order_receipt_time, "2025.09.01 20:04:44");
    }

    #[test]
    fn test_partial_response_defaults() {
        let extracted = extract(r#"{"storeName": "세븐일레븐"}"#);
        assert_eq!(extracted.store_name, "세븐일레븐");
        assert_eq!(extracted.order_number, "");
        assert!(extracted.items.is_empty());
        assert!(extracted.discounts.is_empty());
        assert_eq!(extracted.total_amount, 0);
        assert_eq!(extracted.total_discount, None);
        // Missing time still normalizes to a canonical current timestamp.
        assert!(!extracted.order_receipt_time.is_empty());
    }

    #[test]
    fn test_category_inferred_when_missing() {
        let extracted = extract(
            r#"{"items": [{"name": "서울우유 커피 300ML", "quantity": 1, "price": 1500}]}"#,
        );
        assert_eq!(extracted.items[0].category.as_deref(), Some("음료"));
    }

    #[test]
    fn test_markdown_fences_stripped() {
        let extracted = extract("```json\n{\"storeName\": \"CU\"}\n```");
        assert_eq!(extracted.store_name, "CU");
    }

    #[test]
    fn test_invalid_json_is_hard_error() {
        let result = StructuredExtractor::new().extract("The receipt shows GS25...");
        assert!(matches!(result, Err(ExtractError::InvalidJson(_))));
    }

    #[test]
    fn test_empty_product_code_dropped() {
        let extracted =
            extract(r#"{"items": [{"name": "포장봉투", "productCode": "", "quantity": 1, "price": 200}]}"#);
        assert_eq!(extracted.items[0].product_code, None);
    }
}

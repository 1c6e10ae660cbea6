//! Pattern-rule extraction over flat recognized text.
//!
//! Each field is derived by an independent pure function: ordered candidate
//! regexes, first match wins, unmatched fields resolve to their documented
//! defaults. One field failing to match never affects another, so the
//! strategy as a whole cannot fail.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use super::category::infer_category;
use super::timestamp;
use super::{ExtractError, ExtractedReceipt, ReceiptExtractor};
use crate::config::ExtractionSettings;
use crate::models::ReceiptItem;

/// Store-name sentinel when no brand or suffix pattern matches.
pub const UNKNOWN_STORE: &str = "기타 상점";
/// Sentinel for missing phone numbers.
pub const NO_DATA: &str = "정보 없음";
/// Sentinel for a missing delivery address.
pub const NO_ADDRESS: &str = "주소 정보 없음";
/// Order type when no keyword is present.
pub const GENERAL_ORDER_TYPE: &str = "일반";

static STORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Closed brand list first, then generic suffix patterns.
        "(GS25|CU|세븐일레븐|이마트|홈플러스|롯데마트|코스트코)",
        "([가-힣]+편의점)",
        "([가-힣]+마트)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid store pattern"))
    .collect()
});

static ORDER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"주문번호[:\s]*(\d{14})").expect("valid order number pattern"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3,4}-\d{3,4}-\d{4})").expect("valid phone pattern"));

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣]+시\s+[가-힣]+구\s+[가-힣]+동[^,\n]*)").expect("valid address pattern")
});

// Item lines come in both orderings: quantity before price and price before
// quantity. Both regexes run over the whole text; matches satisfying both
// are intentionally NOT merged unless dedup is enabled in settings.
// The name group is lazy: `원` is itself a Hangul syllable, so a greedy
// name class swallows the digits and the currency marker and the match
// degenerates to zero quantities and prices.
static ITEM_QTY_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣\w\s]+?)\s*(\d+)개?\s*(\d{1,3}(?:,\d{3})*)원").expect("valid item pattern")
});

static ITEM_PRICE_QTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣\w\s]+?)\s*(\d{1,3}(?:,\d{3})*)원\s*(\d+)개?").expect("valid item pattern")
});

static TOTAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"합계\s*(?:금액)?[:\s]*(\d{1,3}(?:,\d{3})*)원",
        r"총\s*금액[:\s]*(\d{1,3}(?:,\d{3})*)원",
        r"결제\s*금액[:\s]*(\d{1,3}(?:,\d{3})*)원",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid total pattern"))
    .collect()
});

static VAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"부가세[:\s]*(\d{1,3}(?:,\d{3})*)원").expect("valid vat pattern"));

static CUSTOMER_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"고객\s*요청사항[:\s]*([^\n]+)").expect("valid request pattern"));

static RIDER_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"라이더\s*요청사항[:\s]*([^\n]+)").expect("valid request pattern")
});

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}\*\*-\*\*\*\*-\d{4})").expect("valid card pattern")
});

static BASIC_POINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"기본적립[:\s]*(\d+)점").expect("valid points pattern"));

static ACCUMULATED_POINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"누적[:\s]*(\d+)점").expect("valid points pattern"));

/// Parse an amount with optional thousands separators.
fn parse_amount(raw: &str) -> Option<i64> {
    raw.replace(',', "").parse().ok()
}

/// Store name from the brand list, then `편의점`/`마트` suffix patterns.
pub fn store_name(text: &str) -> Option<String> {
    STORE_PATTERNS
        .iter()
        .find_map(|p| p.captures(text))
        .map(|c| c[1].to_string())
}

/// Labeled 14-digit order number.
pub fn order_number(text: &str) -> Option<String> {
    ORDER_NUMBER.captures(text).map(|c| c[1].to_string())
}

/// Timestamp-derived synthetic order number for receipts without one.
pub fn synthetic_order_number() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Order type by keyword containment.
pub fn order_type(text: &str) -> Option<&'static str> {
    ["배달", "픽업", "방문"]
        .into_iter()
        .find(|keyword| text.contains(keyword))
}

/// First two phone-shaped tokens: customer-service then rider-service.
pub fn phone_numbers(text: &str) -> (Option<String>, Option<String>) {
    let mut phones = PHONE.find_iter(text).map(|m| m.as_str().to_string());
    (phones.next(), phones.next())
}

/// Region-pattern address (city/district/neighborhood tokens).
pub fn address(text: &str) -> Option<String> {
    ADDRESS.captures(text).map(|c| c[1].to_string())
}

/// Line items from both orderings, validated per match.
pub fn items(text: &str, dedupe: bool) -> Vec<ReceiptItem> {
    let mut items = Vec::new();

    for captures in ITEM_QTY_PRICE.captures_iter(text) {
        push_item(&mut items, &captures[1], &captures[2], &captures[3], dedupe);
    }
    for captures in ITEM_PRICE_QTY.captures_iter(text) {
        push_item(&mut items, &captures[1], &captures[3], &captures[2], dedupe);
    }

    items
}

fn push_item(items: &mut Vec<ReceiptItem>, name: &str, quantity: &str, price: &str, dedupe: bool) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let (Ok(quantity), Some(price)) = (quantity.parse::<u32>(), parse_amount(price)) else {
        return;
    };

    if dedupe
        && items
            .iter()
            .any(|i| i.name == name && i.quantity == quantity && i.price == price)
    {
        return;
    }

    let mut item = ReceiptItem::new(name, quantity, price);
    item.category = Some(infer_category(name).to_string());
    items.push(item);
}

/// Labeled pre-discount total.
pub fn total_amount(text: &str) -> Option<i64> {
    TOTAL_PATTERNS
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| parse_amount(&c[1]))
}

/// Labeled VAT figure; taxable sales derived at the 10% rate.
pub fn vat(text: &str) -> Option<(i64, i64)> {
    VAT.captures(text)
        .and_then(|c| parse_amount(&c[1]))
        .map(|vat| (vat * 10, vat))
}

/// Free-text customer request (remainder of the labeled line).
pub fn customer_request(text: &str) -> Option<String> {
    CUSTOMER_REQUEST
        .captures(text)
        .map(|c| c[1].trim().to_string())
}

/// Free-text rider request (remainder of the labeled line).
pub fn rider_request(text: &str) -> Option<String> {
    RIDER_REQUEST
        .captures(text)
        .map(|c| c[1].trim().to_string())
}

/// Masked card number as printed.
pub fn card_number(text: &str) -> Option<String> {
    CARD_NUMBER.captures(text).map(|c| c[1].to_string())
}

/// Loyalty points: (basic, accumulated).
pub fn loyalty_points(text: &str) -> (Option<i64>, Option<i64>) {
    let basic = BASIC_POINTS
        .captures(text)
        .and_then(|c| parse_amount(&c[1]));
    let accumulated = ACCUMULATED_POINTS
        .captures(text)
        .and_then(|c| parse_amount(&c[1]));
    (basic, accumulated)
}

/// Pattern-rule extraction strategy for plain recognized text.
pub struct PatternExtractor {
    settings: ExtractionSettings,
}

impl PatternExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }
}

impl ReceiptExtractor for PatternExtractor {
    fn extract(&self, raw: &str) -> Result<ExtractedReceipt, ExtractError> {
        let items = items(raw, self.settings.dedupe_items);
        let (customer_phone, rider_phone) = phone_numbers(raw);
        let (taxable_sales, vat) = vat(raw).unwrap_or((0, 0));
        let (points_basic, points_accumulated) = loyalty_points(raw);

        Ok(ExtractedReceipt {
            store_name: store_name(raw).unwrap_or_else(|| UNKNOWN_STORE.to_string()),
            order_number: order_number(raw).unwrap_or_else(synthetic_order_number),
            order_type: order_type(raw).unwrap_or(GENERAL_ORDER_TYPE).to_string(),
            customer_service_phone: customer_phone.unwrap_or_else(|| NO_DATA.to_string()),
            rider_customer_service: rider_phone.unwrap_or_else(|| NO_DATA.to_string()),
            customer_address: address(raw).unwrap_or_else(|| NO_ADDRESS.to_string()),
            items,
            // Pattern rules carry no discount block; discounts only arrive
            // through the structured strategy.
            discounts: Vec::new(),
            total_amount: total_amount(raw).unwrap_or(0),
            total_discount: None,
            final_amount: None,
            taxable_sales,
            vat,
            customer_request: customer_request(raw).unwrap_or_default(),
            rider_request: rider_request(raw).unwrap_or_default(),
            card_number: card_number(raw).unwrap_or_default(),
            loyalty_points_basic: points_basic.unwrap_or(0),
            loyalty_points_accumulated: points_accumulated.unwrap_or(0),
            order_receipt_time: timestamp::normalize_order_time(raw),
        })
    }
}

//! Numeric reconciliation of extracted amounts.
//!
//! Recognition output is best-effort: labeled figures go missing, item
//! lines get mangled, and printed sums do not always agree with the line
//! items. Reconciliation resolves one authoritative figure per aggregate
//! field, preferring extracted labels and falling back to derived values.
//! Disagreement between a declared discount sum and its entries is
//! tolerated and surfaced as-is; this is best-effort accounting, not an
//! audit.

use tracing::warn;

use crate::extract::ExtractedReceipt;

/// Authoritative aggregate figures for one receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledTotals {
    pub total_quantity: u32,
    pub total_amount: i64,
    pub total_discount: Option<i64>,
    pub final_amount: i64,
    pub taxable_sales: i64,
    pub vat: i64,
}

/// Resolve aggregate figures from an extracted field set.
pub fn reconcile(extracted: &ExtractedReceipt) -> ReconciledTotals {
    let item_total: i64 = extracted.items.iter().map(|i| i.line_total()).sum();
    let total_quantity: u32 = extracted.items.iter().map(|i| i.quantity).sum();

    // The labeled total wins when present; otherwise the item sum stands in.
    let total_amount = if extracted.total_amount != 0 {
        extracted.total_amount
    } else {
        item_total
    };

    // 10% VAT assumption, used only when no labeled figure was read.
    let taxable_sales = if extracted.taxable_sales != 0 {
        extracted.taxable_sales
    } else {
        (total_amount as f64 / 1.1).round() as i64
    };
    let vat = if extracted.vat != 0 {
        extracted.vat
    } else {
        (total_amount as f64 / 11.0).round() as i64
    };

    let discount_sum: i64 = extracted.discounts.iter().map(|d| d.amount).sum();
    let total_discount = match (extracted.total_discount, extracted.discounts.is_empty()) {
        (Some(declared), false) if declared != discount_sum => {
            warn!(
                declared,
                summed = discount_sum,
                "discount entries disagree with declared total; keeping declared value"
            );
            Some(declared)
        }
        (Some(declared), _) => Some(declared),
        (None, false) => Some(discount_sum),
        (None, true) => None,
    };

    let final_amount = extracted
        .final_amount
        .unwrap_or(total_amount - total_discount.unwrap_or(0));

    ReconciledTotals {
        total_quantity,
        total_amount,
        total_discount,
        final_amount,
        taxable_sales,
        vat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Discount, ReceiptItem};

    fn extracted_with_items() -> ExtractedReceipt {
        ExtractedReceipt {
            items: vec![
                ReceiptItem::new("포장봉투", 1, 200),
                ReceiptItem::new("농심) 닭다리66G", 1, 1700),
                ReceiptItem::new("유어스) 돌덩이얼음1KG", 2, 2200),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_labeled_total_preferred() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 12900;

        let totals = reconcile(&extracted);
        assert_eq!(totals.total_amount, 12900);
        assert_eq!(totals.total_quantity, 4);
    }

    #[test]
    fn test_item_sum_fallback() {
        let totals = reconcile(&extracted_with_items());
        // 200 + 1700 + 2*2200
        assert_eq!(totals.total_amount, 6300);
    }

    #[test]
    fn test_vat_derived_when_missing() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 12900;

        let totals = reconcile(&extracted);
        assert_eq!(totals.taxable_sales, 11727); // round(12900 / 1.1)
        assert_eq!(totals.vat, 1173); // round(12900 / 11)
    }

    #[test]
    fn test_extracted_tax_figures_kept() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 12900;
        extracted.taxable_sales = 11545;
        extracted.vat = 1155;

        let totals = reconcile(&extracted);
        // Extracted values win even though they are not exactly total/1.1.
        assert_eq!(totals.taxable_sales, 11545);
        assert_eq!(totals.vat, 1155);
    }

    #[test]
    fn test_discount_sum_when_total_absent() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 6300;
        extracted.discounts = vec![
            Discount {
                name: "LG U+할인".to_string(),
                amount: 1000,
            },
            Discount {
                name: "APP전용할인".to_string(),
                amount: 500,
            },
        ];

        let totals = reconcile(&extracted);
        assert_eq!(totals.total_discount, Some(1500));
        assert_eq!(totals.final_amount, 4800);
    }

    #[test]
    fn test_declared_discount_disagreement_tolerated() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 6300;
        extracted.discounts = vec![Discount {
            name: "쿠폰할인".to_string(),
            amount: 700,
        }];
        extracted.total_discount = Some(1000);

        let totals = reconcile(&extracted);
        assert_eq!(totals.total_discount, Some(1000));
        assert_eq!(totals.final_amount, 5300);
    }

    #[test]
    fn test_extracted_final_amount_preferred() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 6300;
        extracted.total_discount = Some(1000);
        extracted.final_amount = Some(5200);

        let totals = reconcile(&extracted);
        assert_eq!(totals.final_amount, 5200);
    }

    #[test]
    fn test_no_discounts_final_equals_total() {
        let mut extracted = extracted_with_items();
        extracted.total_amount = 6300;

        let totals = reconcile(&extracted);
        assert_eq!(totals.total_discount, None);
        assert_eq!(totals.final_amount, 6300);
    }
}

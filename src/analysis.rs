//! Aggregate spend analysis over stored receipts.
//!
//! Pure functions over a receipt slice; the CLI and the API surface both
//! feed these from `ReceiptRepository::list`.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Receipt;

/// Spend statistics for one store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreBreakdown {
    pub store: String,
    pub count: usize,
    pub total_spent: i64,
    pub average_spent: f64,
}

/// Spend statistics for one delivery address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBreakdown {
    pub address: String,
    pub count: usize,
    pub total_spent: i64,
    pub average_spent: f64,
}

/// Purchase statistics for one item name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBreakdown {
    pub item: String,
    /// Number of receipts the item appears on.
    pub count: usize,
    pub total_quantity: u32,
    pub total_spent: i64,
    pub average_price: f64,
}

/// Aggregate view over every stored receipt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAnalysis {
    pub total_receipts: usize,
    pub total_spent: i64,
    pub average_spent: i64,
    pub store_breakdown: Vec<StoreBreakdown>,
    pub address_breakdown: Vec<AddressBreakdown>,
    pub item_breakdown: Vec<ItemBreakdown>,
}

/// Sentinel grouping key for receipts without an address.
const NO_ADDRESS_KEY: &str = "주소 없음";

/// Compute the aggregate analysis for a set of receipts.
pub fn analyze_receipts(receipts: &[Receipt]) -> ReceiptAnalysis {
    if receipts.is_empty() {
        return ReceiptAnalysis {
            total_receipts: 0,
            total_spent: 0,
            average_spent: 0,
            store_breakdown: Vec::new(),
            address_breakdown: Vec::new(),
            item_breakdown: Vec::new(),
        };
    }

    let total_spent: i64 = receipts.iter().map(|r| r.total_amount).sum();
    let average_spent = (total_spent as f64 / receipts.len() as f64).round() as i64;

    let mut stores: HashMap<&str, (usize, i64)> = HashMap::new();
    let mut addresses: HashMap<&str, (usize, i64)> = HashMap::new();
    let mut items: HashMap<&str, (usize, u32, i64)> = HashMap::new();

    for receipt in receipts {
        let store = stores.entry(&receipt.store_name).or_default();
        store.0 += 1;
        store.1 += receipt.total_amount;

        let address_key = if receipt.customer_address.is_empty() {
            NO_ADDRESS_KEY
        } else {
            &receipt.customer_address
        };
        let address = addresses.entry(address_key).or_default();
        address.0 += 1;
        address.1 += receipt.total_amount;

        for item in &receipt.items {
            let entry = items.entry(&item.name).or_default();
            entry.0 += 1;
            entry.1 += item.quantity;
            entry.2 += item.line_total();
        }
    }

    let mut store_breakdown: Vec<StoreBreakdown> = stores
        .into_iter()
        .map(|(store, (count, spent))| StoreBreakdown {
            store: store.to_string(),
            count,
            total_spent: spent,
            average_spent: spent as f64 / count as f64,
        })
        .collect();
    store_breakdown.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

    let mut address_breakdown: Vec<AddressBreakdown> = addresses
        .into_iter()
        .map(|(address, (count, spent))| AddressBreakdown {
            address: address.to_string(),
            count,
            total_spent: spent,
            average_spent: spent as f64 / count as f64,
        })
        .collect();
    address_breakdown.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

    let mut item_breakdown: Vec<ItemBreakdown> = items
        .into_iter()
        .map(|(item, (count, quantity, spent))| ItemBreakdown {
            item: item.to_string(),
            count,
            total_quantity: quantity,
            total_spent: spent,
            average_price: if quantity == 0 {
                0.0
            } else {
                spent as f64 / f64::from(quantity)
            },
        })
        .collect();
    item_breakdown.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

    ReceiptAnalysis {
        total_receipts: receipts.len(),
        total_spent,
        average_spent,
        store_breakdown,
        address_breakdown,
        item_breakdown,
    }
}

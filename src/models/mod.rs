//! Data models for receiptbook.

mod receipt;

pub use receipt::{Discount, Receipt, ReceiptItem};

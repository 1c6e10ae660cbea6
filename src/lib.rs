//! receiptbook - delivery receipt capture and spend analysis system.
//!
//! Turns photographed Korean retail/delivery receipts into structured
//! transaction records: image normalization, recognition-service calls,
//! field extraction (pattern rules or structured model output), numeric
//! reconciliation, and assembly into a canonical `Receipt` stored in a
//! document store for later aggregate analysis.

pub mod analysis;
pub mod assemble;
pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod repository;
pub mod server;
pub mod service;
pub mod vision;

pub use config::Settings;
pub use models::{Discount, Receipt, ReceiptItem};
pub use service::AnalysisService;

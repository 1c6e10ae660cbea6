//! Repository layer for receipt persistence.
//!
//! The analysis core treats storage as an opaque document store: it only
//! produces input for `create`. The trait mirrors the external
//! collaborator's contract (identifier and timestamp assignment on create,
//! newest-first listing, whole-record replacement on update); the bundled
//! implementation keeps one JSON document per receipt on disk.

mod json_store;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Receipt;

pub use json_store::JsonReceiptRepository;

/// Errors from the receipt store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("receipt not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt receipt document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence boundary for receipts.
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Store a new receipt, assigning its identifier and timestamps.
    /// Returns the stored record.
    async fn create(&self, receipt: Receipt) -> Result<Receipt, RepositoryError>;

    /// Point lookup by identifier.
    async fn get(&self, id: &str) -> Result<Option<Receipt>, RepositoryError>;

    /// All receipts, newest first.
    async fn list(&self) -> Result<Vec<Receipt>, RepositoryError>;

    /// Replace a stored receipt, preserving its identity and creation time.
    async fn update(&self, id: &str, receipt: Receipt) -> Result<Receipt, RepositoryError>;

    /// Remove a receipt.
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// Case-insensitive search over store name, order number, and item names.
    async fn search(&self, term: &str) -> Result<Vec<Receipt>, RepositoryError>;
}

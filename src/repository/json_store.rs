//! JSON-document receipt store.
//!
//! One pretty-printed JSON file per receipt under `{data_dir}/receipts/`,
//! named by identifier. Small collections only; listing reads the whole
//! directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::{ReceiptRepository, RepositoryError};
use crate::models::Receipt;

/// Disk-backed receipt repository.
#[derive(Debug, Clone)]
pub struct JsonReceiptRepository {
    receipts_dir: PathBuf,
}

impl JsonReceiptRepository {
    /// Open (creating if needed) the store under the given data directory.
    pub fn open(data_dir: &Path) -> Result<Self, RepositoryError> {
        let receipts_dir = data_dir.join("receipts");
        std::fs::create_dir_all(&receipts_dir)?;
        Ok(Self { receipts_dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Identifiers are generated UUIDs; sanitize anyway so a crafted id
        // cannot escape the store directory.
        let safe: String = id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        self.receipts_dir.join(format!("{safe}.json"))
    }

    fn read_receipt(&self, path: &Path) -> Result<Receipt, RepositoryError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_receipt(&self, receipt: &Receipt) -> Result<(), RepositoryError> {
        let path = self.path_for(&receipt.id);
        let raw = serde_json::to_string_pretty(receipt)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl ReceiptRepository for JsonReceiptRepository {
    async fn create(&self, mut receipt: Receipt) -> Result<Receipt, RepositoryError> {
        // The store owns identity: any request-scoped id is replaced.
        receipt.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        receipt.created_at = Some(now);
        receipt.updated_at = Some(now);

        self.write_receipt(&receipt)?;
        Ok(receipt)
    }

    async fn get(&self, id: &str) -> Result<Option<Receipt>, RepositoryError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_receipt(&path).map(Some)
    }

    async fn list(&self) -> Result<Vec<Receipt>, RepositoryError> {
        let mut receipts = Vec::new();
        for entry in std::fs::read_dir(&self.receipts_dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            match self.read_receipt(&path) {
                Ok(receipt) => receipts.push(receipt),
                // One corrupt document should not hide the rest.
                Err(err) => warn!("skipping unreadable receipt {}: {err}", path.display()),
            }
        }

        receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(receipts)
    }

    async fn update(&self, id: &str, mut receipt: Receipt) -> Result<Receipt, RepositoryError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        receipt.id = existing.id;
        receipt.created_at = existing.created_at;
        receipt.updated_at = Some(Utc::now());

        self.write_receipt(&receipt)?;
        Ok(receipt)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    async fn search(&self, term: &str) -> Result<Vec<Receipt>, RepositoryError> {
        let all = self.list().await?;
        let term = term.trim();
        if term.is_empty() {
            return Ok(all);
        }
        let lowered = term.to_lowercase();

        Ok(all
            .into_iter()
            .filter(|receipt| {
                receipt.store_name.to_lowercase().contains(&lowered)
                    || receipt.order_number.contains(term)
                    || receipt
                        .items
                        .iter()
                        .any(|item| item.name.to_lowercase().contains(&lowered))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceiptItem;

    fn sample_receipt(store: &str) -> Receipt {
        let mut receipt = Receipt::empty();
        receipt.store_name = store.to_string();
        receipt.order_number = "20250901112225".to_string();
        receipt.items = vec![ReceiptItem::new("포장봉투", 1, 200)];
        receipt
    }

    fn open_store(dir: &tempfile::TempDir) -> JsonReceiptRepository {
        JsonReceiptRepository::open(dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_store(&dir);

        let mut incoming = sample_receipt("GS25");
        incoming.id = "request-scoped".to_string();
        let stored = repo.create(incoming).await.unwrap();

        assert_ne!(stored.id, "request-scoped");
        assert!(stored.created_at.is_some());

        let fetched = repo.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_store(&dir);

        let first = repo.create(sample_receipt("GS25")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.create(sample_receipt("CU")).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_store(&dir);

        let stored = repo.create(sample_receipt("GS25")).await.unwrap();
        let mut edited = stored.clone();
        edited.store_name = "GS25 안산와동점".to_string();

        let updated = repo.update(&stored.id, edited).await.unwrap();
        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(updated.store_name, "GS25 안산와동점");

        let missing = repo.update("nope", sample_receipt("CU")).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_store(&dir);

        let stored = repo.create(sample_receipt("GS25")).await.unwrap();
        repo.delete(&stored.id).await.unwrap();
        assert!(repo.get(&stored.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&stored.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_fields() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_store(&dir);

        repo.create(sample_receipt("GS25")).await.unwrap();
        repo.create(sample_receipt("홈플러스")).await.unwrap();

        // Store name, case-insensitive.
        assert_eq!(repo.search("gs25").await.unwrap().len(), 1);
        // Order number substring.
        assert_eq!(repo.search("2025090111").await.unwrap().len(), 2);
        // Item name.
        assert_eq!(repo.search("포장봉투").await.unwrap().len(), 2);
        // Blank terms return everything.
        assert_eq!(repo.search("  ").await.unwrap().len(), 2);
        assert_eq!(repo.search("없는가게").await.unwrap().len(), 0);
    }
}

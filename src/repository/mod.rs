use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod purchase_repository;

pub use purchase_repository::SqlitePurchaseRepository;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Upsert-or-ignore keyed on `transaction_id`. Returns `None` when a
    /// record for the same transaction already exists.
    async fn insert_completed(&self, purchase: NewPurchaseRecord) -> Result<Option<PurchaseRecord>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PurchaseRecord>>;
    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<PurchaseRecord>>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<PurchaseRecord>>;
    async fn count(&self) -> Result<i64>;
}

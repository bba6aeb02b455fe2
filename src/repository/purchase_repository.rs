use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{NewPurchaseRecord, PurchaseRecord, PurchaseStatus, RecordMetadata},
    error::{AppError, Result},
    repository::PurchaseRepository,
};

#[derive(FromRow)]
struct PurchaseRow {
    id: String,
    transaction_id: Option<String>,
    donor_email: String,
    donor_name: String,
    amount_cents: i64,
    currency: String,
    status: String,
    metadata: String,
    created_at: NaiveDateTime,
}

pub struct SqlitePurchaseRepository {
    pool: SqlitePool,
}

impl SqlitePurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_purchase(row: PurchaseRow) -> Result<PurchaseRecord> {
        let metadata: RecordMetadata = serde_json::from_str(&row.metadata)
            .map_err(|e| AppError::Database(format!("Invalid purchase metadata: {}", e)))?;

        Ok(PurchaseRecord {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            transaction_id: row.transaction_id,
            donor_email: row.donor_email,
            donor_name: row.donor_name,
            amount_cents: row.amount_cents,
            currency: row.currency,
            status: Self::parse_status(&row.status)?,
            metadata,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<PurchaseStatus> {
        match s {
            "completed" => Ok(PurchaseStatus::Completed),
            _ => Err(AppError::Database(format!("Invalid purchase status: {}", s))),
        }
    }
}

#[async_trait]
impl PurchaseRepository for SqlitePurchaseRepository {
    async fn insert_completed(&self, purchase: NewPurchaseRecord) -> Result<Option<PurchaseRecord>> {
        let id = Uuid::new_v4();
        let metadata = serde_json::to_string(&purchase.metadata)
            .map_err(|e| AppError::Internal(format!("Failed to encode metadata: {}", e)))?;
        let created_at = purchase.metadata.created_at.naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, transaction_id, donor_email, donor_name,
                amount_cents, currency, status, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(transaction_id) DO NOTHING
            "#
        )
        .bind(id.to_string())
        .bind(&purchase.transaction_id)
        .bind(&purchase.donor_email)
        .bind(&purchase.donor_name)
        .bind(purchase.amount_cents)
        .bind(&purchase.currency)
        .bind(PurchaseStatus::Completed.as_str())
        .bind(metadata)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await?.map(Some).ok_or_else(|| {
            AppError::Database("Failed to retrieve created purchase".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PurchaseRecord>> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, transaction_id, donor_email, donor_name,
                   amount_cents, currency, status, metadata, created_at
            FROM purchases
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_purchase).transpose()
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<PurchaseRecord>> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, transaction_id, donor_email, donor_name,
                   amount_cents, currency, status, metadata, created_at
            FROM purchases
            WHERE transaction_id = ?
            "#
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_purchase).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, transaction_id, donor_email, donor_name,
                   amount_cents, currency, status, metadata, created_at
            FROM purchases
            ORDER BY created_at DESC
            LIMIT ?
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_purchase)
            .collect()
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub donor_email: String,
    pub donor_name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub metadata: RecordMetadata,
    pub created_at: DateTime<Utc>,
}

/// Only completed purchases are ever written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Completed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(rename = "type")]
    pub purchase_type: String,
    pub source: String,
    pub gateway_response_code: Option<String>,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseRecord {
    pub transaction_id: Option<String>,
    pub donor_email: String,
    pub donor_name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub metadata: RecordMetadata,
}

impl PurchaseRecord {
    /// Amount in major units for receipts, e.g. `100.00`.
    pub fn display_amount(&self) -> String {
        format!("{}.{:02}", self.amount_cents / 100, self.amount_cents % 100)
    }
}

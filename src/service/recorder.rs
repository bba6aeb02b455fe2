use std::sync::Arc;

use crate::{
    domain::{Amount, NewPurchaseRecord, PurchaseRecord, RecordMetadata},
    integrations::{IntegrationEvent, IntegrationManager},
    repository::PurchaseRepository,
};

/// Everything the recorder needs about one approved transaction. Buyer
/// fields are optional because gateway callbacks do not always carry them.
#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub transaction_id: Option<String>,
    pub donor_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub metadata: RecordMetadata,
}

#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(PurchaseRecord),
    /// The transaction was already recorded by another entry point.
    Duplicate,
    /// Preconditions not met; nothing was written.
    Skipped(&'static str),
    /// Storage failed. Logged here and otherwise ignored.
    Failed(String),
}

pub struct PurchaseRecorder {
    purchase_repo: Arc<dyn PurchaseRepository>,
    integration_manager: Arc<IntegrationManager>,
}

impl PurchaseRecorder {
    pub fn new(
        purchase_repo: Arc<dyn PurchaseRepository>,
        integration_manager: Arc<IntegrationManager>,
    ) -> Self {
        Self {
            purchase_repo,
            integration_manager,
        }
    }

    fn prepare(request: RecordRequest) -> Result<NewPurchaseRecord, &'static str> {
        let donor_email = request.donor_email.ok_or("missing donor email")?;
        let first_name = request.first_name.ok_or("missing donor first name")?;
        let amount = request
            .amount
            .as_deref()
            .ok_or("missing amount")
            .and_then(|raw| Amount::parse(raw).ok_or("amount is not a positive number"))?;

        let donor_name = match request.last_name {
            Some(last) => format!("{} {}", first_name, last),
            None => first_name,
        };

        Ok(NewPurchaseRecord {
            transaction_id: request.transaction_id,
            donor_email,
            donor_name,
            amount_cents: amount.cents(),
            currency: request
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| "USD".to_string()),
            metadata: request.metadata,
        })
    }

    /// Never fails: every error is logged and reported in the outcome so the
    /// caller's redirect decision stays untouched.
    pub async fn record(&self, request: RecordRequest) -> RecordOutcome {
        let transaction_id = request.transaction_id.clone();
        let source = request.metadata.source.clone();

        let purchase = match Self::prepare(request) {
            Ok(purchase) => purchase,
            Err(reason) => {
                tracing::info!(
                    "Skipping purchase record for transaction {:?} from {}: {}",
                    transaction_id, source, reason
                );
                return RecordOutcome::Skipped(reason);
            }
        };

        match self.purchase_repo.insert_completed(purchase).await {
            Ok(Some(record)) => {
                tracing::info!(
                    "Recorded purchase {} (transaction {:?}, {} cents) from {}",
                    record.id, record.transaction_id, record.amount_cents, source
                );
                self.integration_manager
                    .notify(IntegrationEvent::PurchaseCompleted(record.clone()));
                RecordOutcome::Recorded(record)
            }
            Ok(None) => {
                tracing::info!(
                    "Transaction {:?} already recorded, ignoring duplicate from {}",
                    transaction_id, source
                );
                RecordOutcome::Duplicate
            }
            Err(e) => {
                tracing::error!(
                    "Failed to record purchase for transaction {:?} from {}: {}",
                    transaction_id, source, e
                );
                RecordOutcome::Failed(e.to_string())
            }
        }
    }
}

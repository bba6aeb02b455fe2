use std::{fmt, sync::Arc};

use chrono::Utc;

use crate::{
    domain::{BuyerFields, GatewayResult, RecordMetadata},
    payments::{outcome::Outcome, redirect::Destinations},
    service::{PurchaseRecorder, RecordRequest},
};

/// Which entry point produced a gateway result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Relay,
    Callback,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Relay => "relay",
            Channel::Callback => "callback",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub outcome: Outcome,
    pub location: String,
}

/// Turns a gateway result into the buyer's destination, recording the
/// purchase first when it was approved.
pub struct OutcomeResolver {
    recorder: Arc<PurchaseRecorder>,
    purchase_type: String,
}

impl OutcomeResolver {
    pub fn new(recorder: Arc<PurchaseRecorder>, purchase_type: impl Into<String>) -> Self {
        Self {
            recorder,
            purchase_type: purchase_type.into(),
        }
    }

    pub async fn resolve(
        &self,
        result: &GatewayResult,
        buyer: &BuyerFields,
        channel: Channel,
        destinations: &Destinations,
    ) -> Resolution {
        let outcome = result.outcome();
        let transaction_id = result.transaction_id.as_deref();

        match &outcome {
            Outcome::Approved => {
                tracing::info!(
                    "Payment approved via {} (transaction {:?}, order {:?})",
                    channel, transaction_id, buyer.order_id
                );
                self.recorder
                    .record(self.record_request(result, buyer, channel))
                    .await;
            }
            Outcome::Declined(reason) => {
                tracing::warn!(
                    "Payment declined via {} (transaction {:?}): {} [raw: {}]",
                    channel, transaction_id, reason, result.raw
                );
            }
            Outcome::Ambiguous(raw_text) => {
                tracing::error!(
                    "Unclassified gateway response via {} (transaction {:?}): {} [raw: {}]",
                    channel, transaction_id, raw_text, result.raw
                );
            }
        }

        let location = destinations.for_outcome(&outcome, transaction_id);
        tracing::debug!("Resolved {} result as {}, redirecting to {}", channel, outcome.label(), location);

        Resolution { outcome, location }
    }

    fn record_request(&self, result: &GatewayResult, buyer: &BuyerFields, channel: Channel) -> RecordRequest {
        RecordRequest {
            transaction_id: result.transaction_id.clone(),
            donor_email: buyer.email.clone(),
            first_name: buyer.first_name.clone(),
            last_name: buyer.last_name.clone(),
            amount: buyer.amount.clone(),
            currency: buyer.currency.clone(),
            metadata: RecordMetadata {
                purchase_type: self.purchase_type.clone(),
                source: channel.as_str().to_string(),
                gateway_response_code: result.raw_response_code.clone(),
                order_id: buyer.order_id.clone(),
                created_at: Utc::now(),
            },
        }
    }
}

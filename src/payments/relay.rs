use std::sync::Arc;

use crate::{
    domain::{BuyerFields, GatewayResult},
    payments::{
        gateway::PaymentGateway,
        redirect::Destinations,
        resolver::{Channel, OutcomeResolver, Resolution},
    },
};

/// Forwards the card form's submission upstream and resolves the reply.
pub struct GatewayRelay {
    gateway: Arc<dyn PaymentGateway>,
    resolver: Arc<OutcomeResolver>,
}

impl GatewayRelay {
    pub fn new(gateway: Arc<dyn PaymentGateway>, resolver: Arc<OutcomeResolver>) -> Self {
        Self { gateway, resolver }
    }

    /// A transport failure or timeout becomes a result with no response code,
    /// which classifies as an error.
    pub async fn forward(&self, submission: &str) -> GatewayResult {
        match self.gateway.submit(submission).await {
            Ok(body) => GatewayResult::parse(&body),
            Err(e) => {
                tracing::error!("Gateway relay failed: {}", e);
                GatewayResult::transport_failure(e.to_string())
            }
        }
    }

    pub async fn relay(&self, submission: &str, destinations: &Destinations) -> Resolution {
        let result = self.forward(submission).await;
        // What the buyer submitted outranks what the gateway echoes back
        let buyer = BuyerFields::parse(submission).or(&result.echoed);
        self.resolver
            .resolve(&result, &buyer, Channel::Relay, destinations)
            .await
    }
}

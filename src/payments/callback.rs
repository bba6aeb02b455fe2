use std::sync::Arc;

use crate::{
    domain::GatewayResult,
    payments::{
        redirect::Destinations,
        resolver::{Channel, OutcomeResolver, Resolution},
    },
};

/// Handles the gateway's GET postback / return-URL convention.
pub struct CallbackRouter {
    resolver: Arc<OutcomeResolver>,
}

impl CallbackRouter {
    pub fn new(resolver: Arc<OutcomeResolver>) -> Self {
        Self { resolver }
    }

    /// `None` when the query carries neither `response` nor `responsetext`.
    pub async fn route(&self, query: &str, destinations: &Destinations) -> Option<Resolution> {
        let result = GatewayResult::parse(query);
        if !result.has_response() {
            return None;
        }

        let resolution = self
            .resolver
            .resolve(&result, &result.echoed, Channel::Callback, destinations)
            .await;
        Some(resolution)
    }
}

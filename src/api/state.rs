use std::sync::Arc;
use axum::http::HeaderMap;
use crate::{
    config::Settings,
    payments::{
        CallbackRouter, Destinations, FormSynthesizer, GatewayRelay, OutcomeResolver,
        PaymentGateway,
    },
    service::ServiceContext,
};

pub const CHECKOUT_PATH: &str = "/api/kit-checkout";

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
    pub form_synthesizer: Arc<FormSynthesizer>,
    /// `None` when no gateway credentials are configured.
    pub gateway_relay: Option<Arc<GatewayRelay>>,
    pub callback_router: Arc<CallbackRouter>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        settings: Arc<Settings>,
    ) -> Self {
        let resolver = Arc::new(OutcomeResolver::new(
            service_context.recorder.clone(),
            settings.checkout.purchase_type.clone(),
        ));

        Self {
            form_synthesizer: Arc::new(FormSynthesizer::from_settings(&settings, CHECKOUT_PATH)),
            gateway_relay: gateway.map(|g| Arc::new(GatewayRelay::new(g, resolver.clone()))),
            callback_router: Arc::new(CallbackRouter::new(resolver)),
            service_context,
            settings,
        }
    }

    pub fn destinations(&self, headers: &HeaderMap) -> Destinations {
        Destinations::from_headers(headers, &self.settings.server.base_url, &self.settings.checkout)
    }
}

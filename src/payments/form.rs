use askama::Template;

use crate::{
    config::Settings,
    domain::PurchaseRequest,
    error::{AppError, Result},
};

#[derive(Template)]
#[template(path = "checkout/card_form.html")]
struct CardFormTemplate<'a> {
    action_url: &'a str,
    order_id: &'a str,
    amount: String,
    currency: &'a str,
    description: String,
    buyer_email: Option<&'a str>,
    first_name: &'a str,
    last_name: &'a str,
    success_url_js: String,
    failure_url_js: String,
    poll_interval_ms: u64,
}

/// Quotes a value as a JavaScript string literal that is also safe inside an
/// inline `<script>` element.
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Renders the self-contained card-entry form. The markup targets the relay
/// endpoint and never contains the gateway key.
pub struct FormSynthesizer {
    action_url: String,
    product_name: String,
    poll_interval_ms: u64,
}

impl FormSynthesizer {
    pub fn new(action_url: impl Into<String>, product_name: impl Into<String>, poll_interval_ms: u64) -> Self {
        Self {
            action_url: action_url.into(),
            product_name: product_name.into(),
            poll_interval_ms,
        }
    }

    pub fn from_settings(settings: &Settings, relay_path: &str) -> Self {
        Self::new(
            format!("{}{}", settings.server.base_url.trim_end_matches('/'), relay_path),
            settings.checkout.product_name.clone(),
            settings.checkout.error_poll_interval_ms,
        )
    }

    pub fn synthesize(&self, request: &PurchaseRequest, success_url: &str, failure_url: &str) -> Result<String> {
        let (first_name, last_name) = request.buyer_name_parts();

        let template = CardFormTemplate {
            action_url: &self.action_url,
            order_id: &request.order_id,
            amount: request.amount.to_string(),
            currency: &request.currency,
            description: request.description(&self.product_name),
            buyer_email: request.buyer_email.as_deref(),
            first_name,
            last_name,
            success_url_js: js_string(success_url),
            failure_url_js: js_string(failure_url),
            poll_interval_ms: self.poll_interval_ms,
        };

        template
            .render()
            .map_err(|e| AppError::Internal(format!("Failed to render payment form: {}", e)))
    }
}

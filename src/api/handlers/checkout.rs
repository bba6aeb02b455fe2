use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    api::state::AppState,
    domain::CheckoutFormRequest,
    error::{AppError, Result},
    payments::outcome::FAILED_MESSAGE,
};

#[derive(Debug, Serialize)]
pub struct PaymentFormResponse {
    pub html: String,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// One endpoint, two callers: the embedding page asks for a form with JSON,
/// and the form itself posts back form-encoded card fields.
pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    if is_form_encoded(&headers) {
        return Ok(relay_submission(&state, &headers, &body).await);
    }

    create_payment_form(&state, &headers, &body)
        .map(|form| Json(form).into_response())
}

fn create_payment_form(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<PaymentFormResponse> {
    let request: CheckoutFormRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let purchase = request.into_purchase_request(Utc::now())?;

    if state.gateway_relay.is_none() {
        return Err(AppError::Configuration(
            "Gateway security key missing; cannot issue payment forms".to_string(),
        ));
    }

    let destinations = state.destinations(headers);
    let html = state.form_synthesizer.synthesize(
        &purchase,
        &destinations.success_url(None),
        &destinations.failure_page(),
    )?;

    tracing::debug!(
        "Issued payment form for order {} ({} {})",
        purchase.order_id, purchase.currency, purchase.amount
    );

    Ok(PaymentFormResponse { html })
}

async fn relay_submission(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response {
    let destinations = state.destinations(headers);

    let Some(relay) = state.gateway_relay.as_ref() else {
        tracing::error!("Card form submitted but no gateway is configured");
        return found(&destinations.failure_url(FAILED_MESSAGE));
    };

    let submission = String::from_utf8_lossy(body);
    let resolution = relay.relay(&submission, &destinations).await;
    tracing::info!("Card submission relayed: {}", resolution.outcome.label());
    found(&resolution.location)
}

pub async fn gateway_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let destinations = state.destinations(&headers);
    let query = query.unwrap_or_default();

    let resolution = state
        .callback_router
        .route(&query, &destinations)
        .await
        .ok_or_else(|| {
            AppError::BadRequest("Expected a gateway response or responsetext parameter".to_string())
        })?;

    tracing::info!("Gateway callback handled: {}", resolution.outcome.label());
    Ok(found(&resolution.location))
}

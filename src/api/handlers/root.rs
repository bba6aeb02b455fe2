use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

use crate::api::state::{AppState, CHECKOUT_PATH};

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": "Kit Checkout",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Embeddable payment form, gateway relay and postback handling for kit purchases",
        "status": "operational",
        "gateway_configured": state.gateway_relay.is_some(),
        "endpoints": {
            "health": "/health",
            "checkout": CHECKOUT_PATH,
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1")
        .execute(&state.service_context.db_pool)
        .await;

    let (status, db_status) = match database {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (status, Json(json!({
        "status": if status == StatusCode::OK { "healthy" } else { "degraded" },
        "database": db_status,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

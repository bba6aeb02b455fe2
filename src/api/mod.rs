pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use state::{AppState, CHECKOUT_PATH};

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Form request + card relay (POST), gateway postback (GET)
        .route(
            CHECKOUT_PATH,
            get(handlers::checkout::gateway_callback).post(handlers::checkout::checkout),
        )

        // Add state to the router
        .with_state(app_state)

        // Middleware. The form request comes from the embedding site's origin.
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kit_checkout::{
    api::{self, state::AppState},
    config::Settings,
    integrations::{IntegrationManager, email::EmailIntegration},
    payments::{HttpGateway, PaymentGateway},
    repository::SqlitePurchaseRepository,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kit_checkout=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting kit checkout on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let purchase_repo = Arc::new(SqlitePurchaseRepository::new(db_pool.clone()));

    // Register integrations
    let integration_manager = Arc::new(IntegrationManager::new());

    match EmailIntegration::new(settings.integrations.email.clone()) {
        Ok(Some(email)) => integration_manager.register(Arc::new(email)).await,
        Ok(None) => tracing::info!("Email notifications disabled"),
        Err(e) => tracing::warn!("Email integration not started: {}", e),
    }

    let health_results = integration_manager.health_check_all().await;
    for (name, result) in health_results {
        match result {
            Ok(_) => tracing::info!("Integration {} is healthy", name),
            Err(e) => tracing::warn!("Integration {} health check failed: {:?}", name, e),
        }
    }

    let service_context = Arc::new(ServiceContext::new(
        purchase_repo,
        integration_manager,
        db_pool.clone(),
    ));

    // The gateway is optional at startup; without it form requests fail fast
    let gateway: Option<Arc<dyn PaymentGateway>> = if settings.gateway.security_key().is_some() {
        match HttpGateway::new(&settings.gateway) {
            Ok(gateway) => {
                tracing::info!("Payment gateway relay enabled ({})", settings.gateway.endpoint_url);
                Some(Arc::new(gateway))
            }
            Err(e) => {
                tracing::error!("Payment gateway unavailable: {}", e);
                None
            }
        }
    } else {
        tracing::warn!("No gateway security key configured; payment forms are disabled");
        None
    };

    let app_state = AppState::new(service_context, gateway, Arc::new(settings.clone()));
    let app = api::create_app(app_state);

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}

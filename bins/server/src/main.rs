//! Emisor API Server
//!
//! Main entry point for the comprobante emission backend.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emisor_api::{AppState, create_router};
use emisor_core::authority::SunatClient;
use emisor_db::{EmissionCoordinator, connect};
use emisor_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emisor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create the authority client
    let sunat = SunatClient::new(&config.sunat)?;
    info!(
        base_url = %config.sunat.base_url,
        timeout_secs = config.sunat.timeout_secs,
        "Authority client configured"
    );

    // Create application state
    let coordinator = EmissionCoordinator::new(db.clone(), Arc::new(sunat));
    let state = AppState {
        db: Arc::new(db),
        coordinator: Arc::new(coordinator),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Tandem Server - Main Entry Point

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use tandem_server::chat::{ChatProvider, StreamClient};
use tandem_server::{api, config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Tandem Server"
    );

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    // Initialize chat client (optional - chat tokens will be unavailable if not configured)
    let chat: Option<Arc<dyn ChatProvider>> = if config.has_chat() {
        match StreamClient::from_config(&config) {
            Ok(client) => {
                info!(base_url = %config.stream_base_url, "Chat service configured");
                Some(Arc::new(client) as Arc<dyn ChatProvider>)
            }
            Err(e) => {
                tracing::warn!("Chat client initialization failed: {}. Chat disabled.", e);
                None
            }
        }
    } else {
        tracing::warn!("STREAM_API_KEY or STREAM_API_SECRET missing. Chat disabled.");
        None
    };

    // Build application state
    let state = api::AppState::new(db_pool, config.clone(), chat);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

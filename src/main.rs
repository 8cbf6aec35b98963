//! # Snippetbox Server
//!
//! Entry point: load configuration, open the database, build the route table
//! and serve until Ctrl-C.

use snippetbox::{observability, routes, AppState, Config};
use std::net::SocketAddr;
use tower_sessions_sqlx_store::SqliteStore;

/// Main application entry point
///
/// This function:
/// 1. Sets up logging and the panic hook
/// 2. Loads configuration from environment variables
/// 3. Opens the database (running migrations) and compiles the templates
/// 4. Prepares the session table
/// 5. Builds the route table and middleware chains
/// 6. Serves HTTP until interrupted
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();
    observability::install_panic_hook();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let app_state = AppState::new(&config).await?;
    tracing::info!("Application state initialized");

    // Session records live next to the application tables
    let session_store = SqliteStore::new(app_state.db.clone());
    session_store.migrate().await?;

    let app = routes(app_state, session_store)?;

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Starting server on {}", bind_addr);

    // Connection info lets the request log record the client address
    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

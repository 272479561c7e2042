//! QuoteNest Server
//!
//! Email/password accounts plus a per-user JSON document store. Clients
//! save quotes into `users/{uid}` (or `users/{uid}/quotes/{id}`).
//!
//! # Configuration
//!
//! Environment variables:
//! - `QUOTENEST_PORT`: Port to listen on (default: 8080)
//! - `QUOTENEST_DATA_DIR`: Directory for `users.db` and `documents/` (default: ~/.local/share/quotenest-server)
//! - `QUOTENEST_TOKEN_EXPIRY_HOURS`: Session token lifetime (default: 720)

use quotenest::server::{build_state, router, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotenest=info,quotenest_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| format!("Failed to create data directory: {}", e))?;
    tracing::info!("Data directory: {}", config.data_dir.display());

    let state = build_state(&config).await?;
    tracing::info!("Loaded {} account(s)", state.users.count().await?);

    let tokens = state.tokens.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = tokens.cleanup_expired();
            if removed > 0 {
                tracing::debug!("Removed {} expired token(s)", removed);
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

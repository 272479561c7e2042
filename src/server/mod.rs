//! Server-side modules for the QuoteNest server.

pub mod config;
pub mod db;
pub mod routes;
pub mod tokens;
pub mod users;

pub use config::ServerConfig;
pub use routes::{router, AppState};
pub use tokens::{AuthUser, TokenStore};
pub use users::{User, UserError, UserRepository};

use quote_nest_core::FileStore;
use std::sync::Arc;

/// Opens the user database and document directory named by the config.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, sqlx::Error> {
    let pool = db::init_db(&config.database_path()).await?;

    Ok(AppState {
        users: Arc::new(UserRepository::new(pool)),
        tokens: Arc::new(TokenStore::new(config.token_expiry)),
        documents: Arc::new(FileStore::new(config.documents_dir())),
    })
}

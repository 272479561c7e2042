mod auth;
mod config_cmd;
mod random;
mod saved;

pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use random::RandomCommand;
pub use saved::SavedCommand;

use clap::ValueEnum;
use quote_nest_core::{
    DocumentStore, HttpAuth, HttpStore, QuoteApi, QuoteSync, Session, SessionGate,
};
use std::sync::Arc;

use crate::config::Config;
use crate::session_file::{SessionFile, SessionFileError};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a command needs: config, the restored session and clients.
pub struct Context {
    pub config: Config,
    pub session: Arc<Session>,
    pub session_file: SessionFile,
}

impl Context {
    pub fn load(config: Config) -> Result<Self, SessionFileError> {
        let session_file = SessionFile::new(&config.data_dir.value);
        let session = match session_file.load() {
            Ok(Some(principal)) => Session::signed_in(principal),
            Ok(None) => Session::new(),
            Err(e @ SessionFileError::ParseError(..)) => {
                tracing::warn!("{}; continuing signed out", e);
                Session::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            config,
            session: Arc::new(session),
            session_file,
        })
    }

    pub fn auth(&self) -> HttpAuth {
        HttpAuth::new(&self.config.server_url.value, self.config.request_timeout())
    }

    pub fn quote_api(&self) -> QuoteApi {
        QuoteApi::new(
            &self.config.quotes_api_url.value,
            self.config.request_timeout(),
        )
    }

    /// Sync engine bound to the current session.
    pub fn quote_sync(&self) -> QuoteSync {
        let mut store = HttpStore::new(&self.config.server_url.value, self.config.request_timeout());
        if let Some(token) = self.session.current_principal().and_then(|p| p.token) {
            store = store.with_token(token);
        }
        let store: Arc<dyn DocumentStore> = Arc::new(store);

        QuoteSync::new(self.session.clone(), store).with_layout(self.config.layout.value)
    }
}

/// Splits a comma-separated option into trimmed, non-empty values.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_EXPIRY_HOURS: u64 = 24 * 30;

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Directory holding the user database and documents
    pub data_dir: PathBuf,
    /// How long a session token stays valid
    pub token_expiry: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// - `QUOTENEST_PORT` (default: 8080)
    /// - `QUOTENEST_DATA_DIR` (default: ~/.local/share/quotenest-server)
    /// - `QUOTENEST_TOKEN_EXPIRY_HOURS` (default: 720)
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = var("QUOTENEST_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = var("QUOTENEST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("quotenest-server")
            });

        let hours = var("QUOTENEST_TOKEN_EXPIRY_HOURS")
            .and_then(|h| h.parse::<u64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY_HOURS);

        Self {
            port,
            data_dir,
            token_expiry: Duration::from_secs(hours * 60 * 60),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("users.db")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }
}

use quote_nest_core::remote::{DEFAULT_QUOTES_API_URL, DEFAULT_TIMEOUT_SECS};
use quote_nest_core::StorageLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// QuoteNest server for auth and saved quotes
    pub server_url: ConfigValue<String>,
    /// Base URL of the random quote API
    pub quotes_api_url: ConfigValue<String>,
    /// Where saved quotes live in the user's documents
    pub layout: ConfigValue<StorageLayout>,
    pub request_timeout_secs: ConfigValue<u64>,
    /// Directory holding the saved session
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    server_url: Option<String>,
    quotes_api_url: Option<String>,
    layout: Option<StorageLayout>,
    request_timeout_secs: Option<u64>,
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config.apply_file(file_config, &path);
            config.config_file = Some(path);
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            server_url: ConfigValue::new(DEFAULT_SERVER_URL.to_string(), ConfigSource::Default),
            quotes_api_url: ConfigValue::new(
                DEFAULT_QUOTES_API_URL.to_string(),
                ConfigSource::Default,
            ),
            layout: ConfigValue::new(StorageLayout::default(), ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default),
            data_dir: ConfigValue::new(Self::default_data_dir(), ConfigSource::Default),
            config_file: None,
        }
    }

    fn apply_file(&mut self, file: ConfigFile, path: &std::path::Path) {
        if let Some(url) = file.server_url {
            self.server_url.set(url, ConfigSource::File);
        }
        if let Some(url) = file.quotes_api_url {
            self.quotes_api_url.set(url, ConfigSource::File);
        }
        if let Some(layout) = file.layout {
            self.layout.set(layout, ConfigSource::File);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs.set(secs, ConfigSource::File);
        }
        if let Some(dir) = file.data_dir {
            // Resolve relative paths against config file's directory
            let resolved = if dir.is_relative() {
                path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
            } else {
                dir
            };
            self.data_dir.set(resolved, ConfigSource::File);
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = var("QN_SERVER_URL") {
            self.server_url.set(url, ConfigSource::Environment);
        }
        if let Some(url) = var("QN_QUOTES_API_URL") {
            self.quotes_api_url.set(url, ConfigSource::Environment);
        }
        if let Some(layout) = var("QN_LAYOUT") {
            let layout = layout
                .parse()
                .map_err(|e: String| ConfigError::InvalidValue("QN_LAYOUT".to_string(), e))?;
            self.layout.set(layout, ConfigSource::Environment);
        }
        if let Some(dir) = var("QN_DATA_DIR") {
            self.data_dir
                .set(PathBuf::from(dir), ConfigSource::Environment);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value.max(1))
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/quotenest/
    /// - macOS: ~/Library/Application Support/quotenest/
    /// - Windows: %APPDATA%/quotenest/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotenest")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/quotenest/
    /// - macOS: ~/Library/Application Support/quotenest/
    /// - Windows: %APPDATA%/quotenest/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotenest")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, e) => write!(f, "Invalid value for {}: {}", key, e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.quotes_api_url.value, DEFAULT_QUOTES_API_URL);
        assert_eq!(config.layout.value, StorageLayout::Embedded);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: https://nest.example.com").unwrap();
        writeln!(file, "layout: subdocuments").unwrap();
        writeln!(file, "request_timeout_secs: 3").unwrap();
        writeln!(file, "data_dir: state").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.server_url.value, "https://nest.example.com");
        assert_eq!(config.server_url.source, ConfigSource::File);
        assert_eq!(config.layout.value, StorageLayout::SubDocuments);
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.data_dir.value, temp_dir.path().join("state"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::defaults();
        config.apply_file(
            ConfigFile {
                server_url: Some("http://from-file".to_string()),
                ..Default::default()
            },
            std::path::Path::new("/etc/qn/config.yaml"),
        );

        let env: HashMap<&str, &str> = [
            ("QN_SERVER_URL", "http://from-env"),
            ("QN_LAYOUT", "sub-documents"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server_url.value, "http://from-env");
        assert_eq!(config.server_url.source, ConfigSource::Environment);
        assert_eq!(config.layout.value, StorageLayout::SubDocuments);
        assert_eq!(config.quotes_api_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_layout_accepts_env_spellings() {
        for spelling in ["subdocuments", "sub-documents"] {
            let file: ConfigFile =
                serde_yaml::from_str(&format!("layout: {}", spelling)).unwrap();
            assert_eq!(file.layout, Some(StorageLayout::SubDocuments), "{}", spelling);
        }
    }

    #[test]
    fn test_invalid_layout_env() {
        let mut config = Config::defaults();
        let result = config.apply_env(|key| (key == "QN_LAYOUT").then(|| "flat".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

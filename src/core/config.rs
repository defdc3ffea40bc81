//! Configuration management
//!
//! All credentials, base URLs and timeouts are read once at startup into an
//! immutable [`Config`] that is handed to each component.

use clap::Parser;
use config::{builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder};
use config::{ConfigError as BuilderError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix, e.g. `SHELFDROP_INDEX__COOKIE`
pub const ENV_PREFIX: &str = "SHELFDROP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Invalid index configuration: {0}")]
    InvalidIndex(String),

    #[error("Invalid download client configuration: {0}")]
    InvalidDownloadClient(String),

    #[error("Invalid cover provider configuration: {0}")]
    InvalidCovers(String),

    #[error("Invalid notification configuration: {0}")]
    InvalidNotifications(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub index: IndexConfig,
    pub download_client: DownloadClientConfig,
    pub covers: CoversConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > environment > config file > defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();

        // 1. Defaults (lowest priority)
        let mut builder = with_defaults(ConfigBuilder::builder())?;

        // 2. Config file if specified
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(config_path.display().to_string()));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // 3. Environment variables, e.g. SHELFDROP_SERVER__PORT=8080
        builder = builder.add_source(env_source());

        // 4. CLI arguments (highest priority)
        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = with_defaults(ConfigBuilder::builder())?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration made only of defaults; used by tests and as a base for overrides
    pub fn defaults() -> Result<Self, ConfigError> {
        let config: Config = with_defaults(ConfigBuilder::builder())?
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        self.index.validate()?;
        self.download_client.validate()?;
        self.covers.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Settings that are legal but leave part of the service unusable
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.index.cookie.trim().is_empty() {
            warnings.push("index.cookie is not set; search and downloads will be rejected");
        }
        if self.download_client.url.trim().is_empty() {
            warnings.push("download_client.url is not set; dispatch will fail");
        }
        if self.security.jwt_secret == DEFAULT_JWT_SECRET {
            warnings.push("security.jwt_secret is the built-in default");
        }
        warnings
    }
}

/// `SHELFDROP_` then `__` between nested keys: `SHELFDROP_INDEX__COOKIE` -> `index.cookie`
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

fn with_defaults(
    builder: Builder<DefaultState>,
) -> Result<Builder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.request_timeout", 30)?
        .set_default("database.path", "./data/app.db")?
        .set_default("database.connection_pool_size", 8)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.rotation", "daily")?
        .set_default("security.jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default("security.token_ttl_days", 7)?
        .set_default("security.invite_code", "invite-only-secret")?
        .set_default("security.allowed_origins", vec!["*"])?
        .set_default("index.base_url", "https://www.myanonamouse.net")?
        .set_default("index.cookie", "")?
        .set_default("index.user_agent", "Mozilla/5.0")?
        .set_default("index.search_timeout_secs", 15)?
        .set_default("index.download_timeout_secs", 30)?
        .set_default("download_client.url", "")?
        .set_default("download_client.username", "")?
        .set_default("download_client.password", "")?
        .set_default("download_client.save_path", "/media/audiobooks")?
        .set_default("download_client.login_timeout_secs", 10)?
        .set_default("download_client.add_timeout_secs", 20)?
        .set_default("covers.itunes_url", "https://itunes.apple.com/search")?
        .set_default(
            "covers.google_books_url",
            "https://www.googleapis.com/books/v1/volumes",
        )?
        .set_default("covers.open_library_url", "https://openlibrary.org/search.json")?
        .set_default("covers.timeout_secs", 5)?
        .set_default("covers.trust_negative_cache", false)?
        .set_default("notifications.webhook_url", "")?
        .set_default("notifications.timeout_secs", 5)?)
}

/// Command-line arguments for configuration override
#[derive(Debug, Parser)]
#[command(name = "shelfdrop")]
#[command(about = "Audiobook index search and download gateway", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds; bounds routes that never leave the process. Search, cover and
    /// dispatch routes are bounded by their per-upstream timeouts instead.
    pub request_timeout: u64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: u32,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase(
                "connection_pool_size must be greater than 0".to_string(),
            ));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase(
                "busy_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub rotation: String,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "level must be one of: {:?}",
                valid_levels
            )));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "format must be one of: {:?}",
                valid_formats
            )));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "output must be one of: {:?}",
                valid_outputs
            )));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string(),
            ));
        }

        let valid_rotations = ["never", "hourly", "daily"];
        if !valid_rotations.contains(&self.rotation.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "rotation must be one of: {:?}",
                valid_rotations
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub invite_code: String,
    pub allowed_origins: Vec<String>,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidSecurity("jwt_secret cannot be empty".to_string()));
        }

        if self.token_ttl_days <= 0 {
            return Err(ConfigError::InvalidSecurity(
                "token_ttl_days must be greater than 0".to_string(),
            ));
        }

        if self.invite_code.is_empty() {
            return Err(ConfigError::InvalidSecurity("invite_code cannot be empty".to_string()));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity(
                "allowed_origins cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Private torrent index (search and `.torrent` download)
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub base_url: String,
    pub cookie: String,
    pub user_agent: String,
    pub search_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.base_url).map_err(ConfigError::InvalidIndex)?;

        if self.search_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(ConfigError::InvalidIndex("timeouts must be greater than 0".to_string()));
        }

        Ok(())
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Remote download client daemon (qBittorrent Web API)
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadClientConfig {
    /// Empty until configured; dispatch fails at login in that case
    pub url: String,
    pub username: String,
    pub password: String,
    pub save_path: String,
    pub login_timeout_secs: u64,
    pub add_timeout_secs: u64,
}

impl DownloadClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.trim().is_empty() {
            validate_url(&self.url).map_err(ConfigError::InvalidDownloadClient)?;
        }

        if self.save_path.trim().is_empty() {
            return Err(ConfigError::InvalidDownloadClient(
                "save_path cannot be empty".to_string(),
            ));
        }

        if self.login_timeout_secs == 0 || self.add_timeout_secs == 0 {
            return Err(ConfigError::InvalidDownloadClient(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn add_timeout(&self) -> Duration {
        Duration::from_secs(self.add_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoversConfig {
    pub itunes_url: String,
    pub google_books_url: String,
    pub open_library_url: String,
    pub timeout_secs: u64,
    /// When true a stored "no cover" entry is returned without asking the providers again
    pub trust_negative_cache: bool,
}

impl CoversConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.itunes_url, &self.google_books_url, &self.open_library_url] {
            validate_url(url).map_err(ConfigError::InvalidCovers)?;
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidCovers(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Discord-compatible webhook; blank disables notifications
    pub webhook_url: String,
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.webhook_url.trim().is_empty() {
            validate_url(self.webhook_url.trim()).map_err(ConfigError::InvalidNotifications)?;
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidNotifications(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn webhook(&self) -> Option<&str> {
        let url = self.webhook_url.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn validate_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("invalid url '{}': {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported url scheme '{}' in '{}'", other, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::defaults().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.index.base_url, "https://www.myanonamouse.net");
        assert_eq!(config.download_client.save_path, "/media/audiobooks");
        assert_eq!(config.covers.timeout(), Duration::from_secs(5));
        assert!(!config.covers.trust_negative_cache);
        assert!(config.notifications.webhook().is_none());
    }

    fn from_env(vars: &[(&str, &str)]) -> Config {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        with_defaults(ConfigBuilder::builder())
            .unwrap()
            .add_source(env_source().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        let config = from_env(&[
            ("SHELFDROP_INDEX__COOKIE", "mam_id=from_env"),
            ("SHELFDROP_SERVER__PORT", "9090"),
            ("SHELFDROP_DOWNLOAD_CLIENT__PASSWORD", "hunter2"),
        ]);

        assert_eq!(config.index.cookie, "mam_id=from_env");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.download_client.password, "hunter2");
    }

    #[test]
    fn test_env_ignores_other_prefixes() {
        let config = from_env(&[("OTHER_INDEX__COOKIE", "mam_id=nope")]);
        assert_eq!(config.index.cookie, "");
    }

    #[test]
    fn test_defaults_warn_about_missing_credentials() {
        let config = Config::defaults().unwrap();
        let warnings = config.warnings();
        assert!(warnings.iter().any(|w| w.contains("index.cookie")));
        assert!(warnings.iter().any(|w| w.contains("download_client.url")));
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[index]
cookie = "mam_id=abc"

[download_client]
url = "http://qbit.local:8080"
username = "admin"
password = "secret"

[notifications]
webhook_url = "  https://discord.com/api/webhooks/1/x  "
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.index.cookie, "mam_id=abc");
        assert_eq!(config.download_client.url, "http://qbit.local:8080");
        assert_eq!(
            config.notifications.webhook(),
            Some("https://discord.com/api/webhooks/1/x")
        );
        assert_eq!(config.server.port, 8000);
        assert!(config.warnings().iter().all(|w| !w.contains("index.cookie")));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_logging_validation() {
        let mut logging = Config::defaults().unwrap().logging;
        logging.output = "file".to_string();
        logging.log_file = None;
        assert!(matches!(
            logging.validate(),
            Err(ConfigError::InvalidLogging(_))
        ));

        logging.output = "stdout".to_string();
        logging.rotation = "weekly".to_string();
        assert!(logging.validate().is_err());
    }

    #[test]
    fn test_download_client_url_must_be_http() {
        let mut download_client = Config::defaults().unwrap().download_client;
        download_client.url = "ftp://qbit.local".to_string();
        assert!(matches!(
            download_client.validate(),
            Err(ConfigError::InvalidDownloadClient(_))
        ));

        download_client.url = String::new();
        assert!(download_client.validate().is_ok());
    }

    #[test]
    fn test_zero_cover_timeout_rejected() {
        let mut covers = Config::defaults().unwrap().covers;
        covers.timeout_secs = 0;
        assert!(matches!(covers.validate(), Err(ConfigError::InvalidCovers(_))));
    }
}

//! Configuration
//!
//! TOML file with per-field defaults, then `GAUGEBOARD_*` environment
//! overrides on top.

use crate::auth::AuthSettings;
use crate::storage::DatabaseLocation;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("gaugeboard").join("gaugeboard.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./gaugeboard.db".to_string())
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl StorageConfig {
    /// Resolved database location; a leading `~/` expands to the home directory
    pub fn location(&self) -> DatabaseLocation {
        match (self.database_path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => DatabaseLocation::File(home.join(rest)),
            _ => DatabaseLocation::from_config(&self.database_path),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Account created at startup when missing
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,

    #[serde(default = "default_true")]
    pub allow_guest: bool,

    #[serde(default = "default_true")]
    pub allow_registration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

fn default_session_ttl() -> u64 {
    720 // 30 days
}

fn default_true() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bootstrap_admin: None,
            session_ttl_hours: default_session_ttl(),
            allow_guest: true,
            allow_registration: true,
        }
    }
}

impl AuthConfig {
    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            allow_guest: self.allow_guest,
            allow_registration: self.allow_registration,
            session_ttl_millis: (self.session_ttl_hours as i64).saturating_mul(3_600_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First readable file from the standard locations, else env-only
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("gaugeboard").join("config.toml")),
            Some(PathBuf::from("/etc/gaugeboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `GAUGEBOARD_*` overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("GAUGEBOARD_DB_PATH") {
            self.storage.database_path = path;
        }

        if let Some(host) = lookup("GAUGEBOARD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("GAUGEBOARD_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid GAUGEBOARD_API_PORT"),
            }
        }

        match (lookup("GAUGEBOARD_ADMIN_USER"), lookup("GAUGEBOARD_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => {
                self.auth.bootstrap_admin = Some(BootstrapAdmin { username, password });
            }
            (Some(username), None) => {
                if let Some(admin) = self.auth.bootstrap_admin.as_mut() {
                    admin.username = username;
                }
            }
            (None, Some(password)) => {
                if let Some(admin) = self.auth.bootstrap_admin.as_mut() {
                    admin.password = password;
                }
            }
            (None, None) => {}
        }

        if let Some(level) = lookup("GAUGEBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("GAUGEBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Contents of a commented default config file
pub fn generate_default_config() -> String {
    r#"# Gaugeboard Configuration
#
# Environment variables override these settings:
# - GAUGEBOARD_DB_PATH
# - GAUGEBOARD_API_HOST
# - GAUGEBOARD_API_PORT
# - GAUGEBOARD_ADMIN_USER / GAUGEBOARD_ADMIN_PASSWORD
# - GAUGEBOARD_LOG_LEVEL
# - GAUGEBOARD_LOG_FORMAT

[storage]
# SQLite database file, or ":memory:" for a throwaway database
database_path = "~/.local/share/gaugeboard/gaugeboard.db"

# How long a writer waits on a locked database (ms)
busy_timeout_ms = 5000

[api]
host = "0.0.0.0"
port = 5000

# Allowed CORS origins; an empty list allows any origin
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[auth]
# Session lifetime (hours)
session_ttl_hours = 720

# Allow read-only guest sessions
allow_guest = true

# Allow self-service registration
allow_registration = true

# Account created on first start if missing
# [auth.bootstrap_admin]
# username = "admin"
# password = "change-me"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

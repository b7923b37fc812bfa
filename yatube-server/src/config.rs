//! Server configuration - defaults, TOML file and environment loading
//!
//! Precedence (lowest to highest): built-in defaults, `~/.yatube/config.toml`
//! (or an explicit path), `YATUBE_*` environment variables. The CLI applies
//! its flags on top.
//!
//! Environment variables:
//! - `YATUBE_BIND`: socket address to listen on
//! - `YATUBE_DATABASE_URL` (or `DATABASE_URL`): sqlx SQLite URL
//! - `YATUBE_MEDIA_ROOT`: directory for uploaded images
//! - `YATUBE_INDEX_CACHE_TTL`: index page cache lifetime in seconds (0 disables)
//! - `YATUBE_SESSION_TTL`: login session lifetime in seconds
//! - `YATUBE_SECURE_COOKIES`: mark the session cookie `Secure`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Two weeks, in seconds
const DEFAULT_SESSION_TTL_SECS: u64 = 1_209_600;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// SQLite database URL (default: sqlite://~/.yatube/yatube.db)
    pub database_url: String,

    /// Directory uploaded images are written to and served from
    pub media_root: PathBuf,

    /// Lifetime of a cached index page (default: 20s, 0 disables caching)
    pub index_cache_ttl_secs: u64,

    /// Lifetime of a login session (default: two weeks)
    pub session_ttl_secs: u64,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Add `Secure` to the session cookie (enable behind HTTPS)
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let home = Self::home_dir();
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_url: format!("sqlite://{}", home.join("yatube.db").display()),
            media_root: home.join("media"),
            index_cache_ttl_secs: 20,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            request_timeout_secs: 30,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Data directory: ~/.yatube
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".yatube")
    }

    /// Default config file path: ~/.yatube/config.toml
    pub fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Config for tests: in-memory database, caching off.
    pub fn for_tests(media_root: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            media_root,
            index_cache_ttl_secs: 0,
            ..Self::default()
        }
    }

    /// Load from an explicit file, or from the default path when it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `YATUBE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("YATUBE_BIND") {
            self.bind_addr = parse_env("YATUBE_BIND", value)?;
        }
        if let Some(value) = lookup("YATUBE_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.database_url = value;
        }
        if let Some(value) = lookup("YATUBE_MEDIA_ROOT") {
            self.media_root = PathBuf::from(value);
        }
        if let Some(value) = lookup("YATUBE_INDEX_CACHE_TTL") {
            self.index_cache_ttl_secs = parse_env("YATUBE_INDEX_CACHE_TTL", value)?;
        }
        if let Some(value) = lookup("YATUBE_SESSION_TTL") {
            self.session_ttl_secs = parse_env("YATUBE_SESSION_TTL", value)?;
        }
        if let Some(value) = lookup("YATUBE_SECURE_COOKIES") {
            self.secure_cookies = parse_env("YATUBE_SECURE_COOKIES", value)?;
        }
        Ok(())
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.index_cache_ttl_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

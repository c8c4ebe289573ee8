//! API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional
//! `shopbook.toml`, then `SHOPBOOK__*` environment variables (a `.env` file
//! is loaded into the environment first).
//!
//! ```text
//! SHOPBOOK__BIND_ADDR=0.0.0.0:8080
//! SHOPBOOK__DATABASE_PATH=shopbook.db
//! SHOPBOOK__JWT_SECRET=...
//! SHOPBOOK__BOOTSTRAP__PASSWORD=...
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use shopbook_db::DbConfig;

/// Minimum length of the token signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listen address, e.g. `0.0.0.0:8080`
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Super-admin created at startup when none exists
    pub bootstrap: BootstrapConfig,
}

/// Credentials of the first super-admin.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub handle: String,
    pub display_name: String,
    /// No account is created while this is unset.
    #[serde(default)]
    pub password: Option<String>,
}

impl AppConfig {
    /// Load configuration from `.env`, `shopbook.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::InvalidValue(format!(".env: {}", e)));
            }
        }

        let config = Self::builder()?
            .add_source(File::with_name("shopbook").required(false))
            .add_source(Environment::with_prefix("SHOPBOOK").separator("__"))
            .build()?
            .try_deserialize::<AppConfig>()?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults only. Used by tests and as the base layer of [`AppConfig::load`].
    pub fn defaults() -> Result<Self, ConfigError> {
        Ok(Self::builder()?.build()?.try_deserialize()?)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("database_path", "shopbook.db")?
            .set_default("max_connections", 5)?
            .set_default("jwt_secret", "")?
            .set_default("session_lifetime_secs", 8 * 3600)? // 8 hours
            .set_default("bootstrap.handle", "superadmin")?
            .set_default("bootstrap.display_name", "Super Admin")?)
    }

    /// Checks values the deserializer cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "jwt_secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "session_lifetime_secs must be positive".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bind_addr: {}", self.bind_addr)))
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(5))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

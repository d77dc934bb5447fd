use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

const HOST: &str = "DATABASE_HOST";
const USER: &str = "DATABASE_USER";
const PASSWORD: &str = "DATABASE_PASSWORD";
const NAME: &str = "DATABASE_NAME";
const PORT: &str = "DATABASE_PORT";

/// Database connection settings. All five values are required; there are no
/// defaults and a missing or malformed value is fatal at startup.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

impl DbConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary lookup function. Split out
    /// from `from_env` so the parsing rules can be tested without touching
    /// process-global state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let port_raw = require(PORT)?;
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid(PORT, port_raw.clone()))?;

        Ok(Self {
            host: require(HOST)?,
            user: require(USER)?,
            password: require(PASSWORD)?,
            database: require(NAME)?,
            port,
        })
    }

    /// Connection options for sqlx. TLS is disabled explicitly, matching the
    /// deployment this service targets.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(PgSslMode::Disable)
    }
}

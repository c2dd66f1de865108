use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

/// Settings read from the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// The shared admin secret, admin features are unavailable without it
    pub admin_password: Option<String>,
    pub admin_session_salt: Option<String>,
    /// Key for the RAWG catalog, catalog features are unavailable without it
    pub rawg_api_key: Option<String>,
    /// How long to wait on the database before giving up
    pub store_timeout: Duration,
    /// Mark the admin session cookie as HTTPS only
    pub secure_cookies: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value \"{value}\"")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub const DEFAULT_PORT: u16 = 9050;
    pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any source of variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let var = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = parse(&var, "GAMEHUB_SERVER_PORT")?.unwrap_or(Self::DEFAULT_PORT);
        let timeout_secs = parse(&var, "GAMEHUB_STORE_TIMEOUT_SECS")?
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(Self::DEFAULT_STORE_TIMEOUT_SECS);
        let secure_cookies = parse(&var, "GAMEHUB_SECURE_COOKIES")?.unwrap_or(false);

        Ok(Self {
            port,
            database_url,
            admin_password: var("ADMIN_PASSWORD"),
            admin_session_salt: var("ADMIN_SESSION_SALT"),
            rawg_api_key: var("RAWG_API_KEY"),
            store_timeout: Duration::from_secs(timeout_secs),
            secure_cookies,
        })
    }
}

fn parse<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    var(name)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

//! Environment-driven application configuration.
//!
//! Values are read from the process environment (optionally seeded from a
//! `.env` file by `main`) and deserialized with `envy`. Durations accept the
//! humantime format, e.g. `5m`, `10s`, `1h 30m`.

pub mod logging;

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use logging::init_logger;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("rate limiter requires a non-zero request budget and window")]
    RateLimiter,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database_url: String,
    #[serde(default = "default_db_max_open_conns")]
    pub db_max_open_conns: u32,
    #[serde(default = "default_db_max_idle_conns")]
    pub db_max_idle_conns: u32,
    #[serde(default = "default_db_conn_max_lifetime", with = "humantime_serde")]
    pub db_conn_max_lifetime: Duration,
    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Deadline for handling a single request, storage calls included.
    #[serde(default = "default_write_timeout", with = "humantime_serde")]
    pub write_timeout: Duration,
    #[serde(default = "default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    #[serde(default = "default_rate_limit_expiration", with = "humantime_serde")]
    pub rate_limit_expiration: Duration,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    #[serde(default = "default_env")]
    pub env: String,
}

/// Connection pool sizing handed to the storage gateway.
#[derive(Clone)]
pub struct PoolSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            database_url: self.database_url.clone(),
            max_connections: self.db_max_open_conns.max(1),
            min_connections: self.db_max_idle_conns.min(self.db_max_open_conns),
            max_lifetime: self.db_conn_max_lifetime,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &"[REDACTED]")
            .field("db_max_open_conns", &self.db_max_open_conns)
            .field("db_max_idle_conns", &self.db_max_idle_conns)
            .field("db_conn_max_lifetime", &self.db_conn_max_lifetime)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_expiration", &self.rate_limit_expiration)
            .field("cors_origins", &self.cors_origins)
            .field("env", &self.env)
            .finish()
    }
}

impl fmt::Debug for PoolSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolSettings")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("max_lifetime", &self.max_lifetime)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_max_open_conns() -> u32 {
    25
}

fn default_db_max_idle_conns() -> u32 {
    5
}

fn default_db_conn_max_lifetime() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_write_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_rate_limit_expiration() -> Duration {
    Duration::from_secs(60)
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

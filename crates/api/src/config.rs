//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PLANETARIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Only required when storage is `postgres`.
//!
//! ## Optional
//! - `PLANETARIUM_STORAGE` - `postgres` or `memory` (default: postgres)
//! - `PLANETARIUM_HOST` - Bind address (default: 127.0.0.1)
//! - `PLANETARIUM_PORT` - Listen port (default: 8000)
//! - `PLANETARIUM_BOOKING_TIMEOUT_MS` - Booking deadline in milliseconds (default: 5000)
//! - `PLANETARIUM_DOME_CACHE_CAPACITY` - Domes kept in the seat map cache (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::booking::BookingOptions;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// `PostgreSQL` via `PLANETARIUM_DATABASE_URL`.
    Postgres,
    /// In-process store seeded with the demo catalog.
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected `postgres` or `memory`, got `{other}`")),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Storage backend
    pub storage: StorageKind,
    /// `PostgreSQL` connection URL (contains password); `None` for memory storage
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deadline for one booking attempt
    pub booking_timeout: Duration,
    /// Maximum number of cached dome seat maps
    pub dome_cache_capacity: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let storage = env.parse_or_default("PLANETARIUM_STORAGE", StorageKind::Postgres)?;
        let database_url = match storage {
            StorageKind::Postgres => Some(env.database_url("PLANETARIUM_DATABASE_URL")?),
            StorageKind::Memory => env
                .database_url("PLANETARIUM_DATABASE_URL")
                .ok(),
        };
        let host = env.parse_or_default("PLANETARIUM_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or_default("PLANETARIUM_PORT", 8000_u16)?;
        let timeout_ms = env.parse_or_default("PLANETARIUM_BOOKING_TIMEOUT_MS", 5000_u64)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PLANETARIUM_BOOKING_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let dome_cache_capacity =
            env.parse_or_default("PLANETARIUM_DOME_CACHE_CAPACITY", 1000_u64)?;

        Ok(Self {
            storage,
            database_url,
            host,
            port,
            booking_timeout: Duration::from_millis(timeout_ms),
            dome_cache_capacity,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Booking engine options derived from this configuration.
    #[must_use]
    pub const fn booking_options(&self) -> BookingOptions {
        BookingOptions {
            timeout: self.booking_timeout,
            dome_cache_capacity: self.dome_cache_capacity,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, or use `default` when it is unset.
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

//! Database operations for the planetarium `PostgreSQL` database.
//!
//! ## Tables (schema `planetarium`)
//!
//! - `astronomy_show` - Shows that can be screened
//! - `planetarium_dome` - Domes and their seat grid geometry
//! - `show_session` - Scheduled screenings of a show in a dome
//! - `reservation` - Committed bookings
//! - `ticket` - One row per booked seat, unique per `(show_session_id, row_number, seat_number)`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p planetarium-cli -- migrate
//! ```

pub mod catalog;
pub mod ledger;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use ledger::LedgerRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A value to be written does not fit its column.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations from `crates/api/migrations/`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Convert a non-negative database integer into a `u16` domain value.
pub(crate) fn to_u16(field: &str, value: i32) -> Result<u16, RepositoryError> {
    u16::try_from(value).map_err(|_| {
        RepositoryError::DataCorruption(format!("{field} {value} does not fit in u16"))
    })
}

//! Seed the database with the demo catalog.

use tracing::info;

use planetarium_api::db::CatalogRepository;
use planetarium_api::seed;

/// Insert demo domes, shows and sessions.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let summary = seed::seed_postgres(&CatalogRepository::new(pool)).await?;

    for session in &summary.sessions {
        info!(
            session_id = %session.id,
            dome_id = %session.dome,
            show_begin = %session.show_begin,
            "Session created"
        );
    }
    Ok(())
}

//! Catalog repository: domes, astronomy shows and show sessions.
//!
//! The booking engine only reads the catalog. The insert helpers exist for
//! the `seed` command and for tests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use planetarium_core::{
    AstronomyShow, AstronomyShowId, Dome, DomeId, SessionFilter, ShowSession, ShowSessionId,
};

use super::{RepositoryError, to_u16};
use crate::booking::SeatCatalog;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DomeRow {
    id: i32,
    name: String,
    description: Option<String>,
    rows_count: i32,
    seats_in_row: i32,
}

impl TryFrom<DomeRow> for Dome {
    type Error = RepositoryError;

    fn try_from(row: DomeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DomeId::new(row.id),
            name: row.name,
            description: row.description,
            rows: to_u16("rows_count", row.rows_count)?,
            seats_in_row: to_u16("seats_in_row", row.seats_in_row)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShowRow {
    id: i32,
    title: String,
    description: String,
    duration_minutes: i32,
}

impl TryFrom<ShowRow> for AstronomyShow {
    type Error = RepositoryError;

    fn try_from(row: ShowRow) -> Result<Self, Self::Error> {
        let duration_minutes = u32::try_from(row.duration_minutes).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative duration {} for show {}",
                row.duration_minutes, row.id
            ))
        })?;

        Ok(Self {
            id: AstronomyShowId::new(row.id),
            title: row.title,
            description: row.description,
            duration_minutes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i32,
    astronomy_show_id: i32,
    dome_id: i32,
    show_begin: DateTime<Utc>,
}

impl From<SessionRow> for ShowSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: ShowSessionId::new(row.id),
            astronomy_show: AstronomyShowId::new(row.astronomy_show_id),
            dome: DomeId::new(row.dome_id),
            show_begin: row.show_begin,
        }
    }
}

fn check_geometry(rows: u16, seats_in_row: u16) -> Result<(), RepositoryError> {
    if Dome::is_supported_geometry(rows, seats_in_row) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidValue(format!(
            "dome of {rows} x {seats_in_row} seats is outside 1..={} x 1..={}",
            Dome::MAX_ROWS,
            Dome::MAX_SEATS_IN_ROW
        )))
    }
}

fn duration_column(duration_minutes: u32) -> Result<i32, RepositoryError> {
    i32::try_from(duration_minutes).map_err(|_| {
        RepositoryError::InvalidValue(format!("duration {duration_minutes} is too long"))
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog lookups.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check that the database answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a dome by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored geometry is invalid.
    #[instrument(skip(self), fields(dome_id = %id))]
    pub async fn get_dome(&self, id: DomeId) -> Result<Option<Dome>, RepositoryError> {
        let row = sqlx::query_as::<_, DomeRow>(
            r"
            SELECT id, name, description, rows_count, seats_in_row
            FROM planetarium.planetarium_dome
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a show session by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn get_session(
        &self,
        id: ShowSessionId,
    ) -> Result<Option<ShowSession>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT id, astronomy_show_id, dome_id, show_begin
            FROM planetarium.show_session
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an astronomy show by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored duration is negative.
    #[instrument(skip(self), fields(show_id = %id))]
    pub async fn get_show(
        &self,
        id: AstronomyShowId,
    ) -> Result<Option<AstronomyShow>, RepositoryError> {
        let row = sqlx::query_as::<_, ShowRow>(
            r"
            SELECT id, title, description, duration_minutes
            FROM planetarium.astronomy_show
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List sessions matching `filter`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<ShowSession>, RepositoryError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT id, astronomy_show_id, dome_id, show_begin
            FROM planetarium.show_session
            WHERE ($1::INTEGER IS NULL OR astronomy_show_id = $1)
              AND ($2::INTEGER IS NULL OR dome_id = $2)
              AND ($3::DATE IS NULL OR (show_begin AT TIME ZONE 'UTC')::DATE = $3)
            ORDER BY show_begin, id
            ",
        )
        .bind(filter.astronomy_show)
        .bind(filter.planetarium_dome)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Inserts (seeding)
    // =========================================================================

    /// Insert a dome.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    /// Returns `RepositoryError::InvalidValue` if the grid is empty or larger
    /// than `Dome::MAX_ROWS` x `Dome::MAX_SEATS_IN_ROW`.
    pub async fn insert_dome(
        &self,
        name: &str,
        description: Option<&str>,
        rows: u16,
        seats_in_row: u16,
    ) -> Result<Dome, RepositoryError> {
        check_geometry(rows, seats_in_row)?;

        let row = sqlx::query_as::<_, DomeRow>(
            r"
            INSERT INTO planetarium.planetarium_dome (name, description, rows_count, seats_in_row)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, rows_count, seats_in_row
            ",
        )
        .bind(name)
        .bind(description)
        .bind(i32::from(rows))
        .bind(i32::from(seats_in_row))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Insert an astronomy show.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    /// Returns `RepositoryError::InvalidValue` if the duration does not fit the column.
    pub async fn insert_show(
        &self,
        title: &str,
        description: &str,
        duration_minutes: u32,
    ) -> Result<AstronomyShow, RepositoryError> {
        let duration = duration_column(duration_minutes)?;

        let row = sqlx::query_as::<_, ShowRow>(
            r"
            INSERT INTO planetarium.astronomy_show (title, description, duration_minutes)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, duration_minutes
            ",
        )
        .bind(title)
        .bind(description)
        .bind(duration)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Insert a show session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// unknown show or dome references).
    pub async fn insert_session(
        &self,
        show: AstronomyShowId,
        dome: DomeId,
        show_begin: DateTime<Utc>,
    ) -> Result<ShowSession, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            INSERT INTO planetarium.show_session (astronomy_show_id, dome_id, show_begin)
            VALUES ($1, $2, $3)
            RETURNING id, astronomy_show_id, dome_id, show_begin
            ",
        )
        .bind(show)
        .bind(dome)
        .bind(show_begin)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

impl SeatCatalog for CatalogRepository {
    async fn get_dome(&self, id: DomeId) -> Result<Option<Dome>, RepositoryError> {
        Self::get_dome(self, id).await
    }

    async fn get_session(&self, id: ShowSessionId) -> Result<Option<ShowSession>, RepositoryError> {
        Self::get_session(self, id).await
    }

    async fn get_show(&self, id: AstronomyShowId) -> Result<Option<AstronomyShow>, RepositoryError> {
        Self::get_show(self, id).await
    }
}

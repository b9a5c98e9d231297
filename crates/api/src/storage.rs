//! Storage backend selection.

use planetarium_core::{
    AstronomyShow, AstronomyShowId, Dome, DomeId, NewReservation, Reservation, ReservationId,
    SessionFilter, ShowSession, ShowSessionId, Ticket, UserId,
};
use sqlx::PgPool;

use crate::booking::{LedgerError, MemoryStore, ReservationLedger, SeatCatalog};
use crate::db::{CatalogRepository, LedgerRepository, RepositoryError};

/// The catalog and ledger the API runs against.
#[derive(Debug, Clone)]
pub enum Storage {
    /// `PostgreSQL` tables in schema `planetarium`.
    Postgres {
        /// Catalog lookups.
        catalog: CatalogRepository,
        /// Reservation ledger.
        ledger: LedgerRepository,
    },
    /// In-process maps.
    Memory(MemoryStore),
}

impl Storage {
    /// Storage over a `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres {
            catalog: CatalogRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool),
        }
    }

    /// Storage over an in-memory store.
    #[must_use]
    pub const fn memory(store: MemoryStore) -> Self {
        Self::Memory(store)
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check that the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres { catalog, .. } => catalog.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Sessions matching `filter`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<ShowSession>, RepositoryError> {
        match self {
            Self::Postgres { catalog, .. } => catalog.list_sessions(filter).await,
            Self::Memory(store) => Ok(store.list_sessions(filter)),
        }
    }
}

impl SeatCatalog for Storage {
    async fn get_dome(&self, id: DomeId) -> Result<Option<Dome>, RepositoryError> {
        match self {
            Self::Postgres { catalog, .. } => catalog.get_dome(id).await,
            Self::Memory(store) => store.get_dome(id).await,
        }
    }

    async fn get_session(&self, id: ShowSessionId) -> Result<Option<ShowSession>, RepositoryError> {
        match self {
            Self::Postgres { catalog, .. } => catalog.get_session(id).await,
            Self::Memory(store) => store.get_session(id).await,
        }
    }

    async fn get_show(&self, id: AstronomyShowId) -> Result<Option<AstronomyShow>, RepositoryError> {
        match self {
            Self::Postgres { catalog, .. } => catalog.get_show(id).await,
            Self::Memory(store) => store.get_show(id).await,
        }
    }
}

impl ReservationLedger for Storage {
    async fn append(&self, reservation: NewReservation) -> Result<Reservation, LedgerError> {
        match self {
            Self::Postgres { ledger, .. } => ledger.append(reservation).await,
            Self::Memory(store) => store.append(reservation).await,
        }
    }

    async fn list_for_session(
        &self,
        session: ShowSessionId,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        match self {
            Self::Postgres { ledger, .. } => ledger.list_for_session(session).await,
            Self::Memory(store) => store.list_for_session(session).await,
        }
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        match self {
            Self::Postgres { ledger, .. } => ledger.list_for_user(user).await,
            Self::Memory(store) => store.list_for_user(user).await,
        }
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        match self {
            Self::Postgres { ledger, .. } => ledger.get_reservation(id).await,
            Self::Memory(store) => store.get_reservation(id).await,
        }
    }
}

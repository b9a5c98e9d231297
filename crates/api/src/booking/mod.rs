//! Seat reservation engine.
//!
//! # Components (leaf to root)
//!
//! - [`SeatMapRegistry`] - valid seat coordinates per dome (cached, geometry is immutable)
//! - [`AvailabilityIndex`] - taken/free seats per session, derived from the ledger on every read
//! - [`ReservationService`] - validates and commits seat selections atomically
//! - [`ReservationLedger`] - durable record of committed reservations
//!
//! # Concurrency
//!
//! Two mechanisms keep the per-session seat sets disjoint:
//!
//! 1. `ReservationService` holds a per-session async mutex ([`SessionLocks`])
//!    from the availability check through the ledger append, so attempts on
//!    the same session inside one process run one at a time.
//! 2. Every `ReservationLedger::append` re-checks `(session, seat)` uniqueness
//!    at write time and rejects with [`LedgerError::Conflict`]. This covers
//!    several API processes sharing one database.
//!
//! Different sessions never contend with each other.

mod availability;
mod error;
mod locks;
mod manager;
pub mod memory;
mod registry;

use std::future::Future;

use planetarium_core::{
    AstronomyShow, AstronomyShowId, Dome, DomeId, NewReservation, Reservation, ReservationId, Seat,
    ShowSession, ShowSessionId, Ticket, UserId,
};
use thiserror::Error;

use crate::db::RepositoryError;

pub use availability::{AvailabilityIndex, SeatMap};
pub use error::{BookingError, ErrorKind};
pub use locks::{SessionGuard, SessionLocks};
pub use manager::{BookingOptions, ReservationService};
pub use memory::MemoryStore;
pub use registry::SeatMapRegistry;

/// Read-only access to domes, shows and sessions.
///
/// Catalog data is maintained outside the booking engine; the engine only
/// looks it up.
pub trait SeatCatalog: Send + Sync {
    /// Look up a dome by ID.
    fn get_dome(
        &self,
        id: DomeId,
    ) -> impl Future<Output = Result<Option<Dome>, RepositoryError>> + Send;

    /// Look up a show session by ID.
    fn get_session(
        &self,
        id: ShowSessionId,
    ) -> impl Future<Output = Result<Option<ShowSession>, RepositoryError>> + Send;

    /// Look up an astronomy show by ID.
    fn get_show(
        &self,
        id: AstronomyShowId,
    ) -> impl Future<Output = Result<Option<AstronomyShow>, RepositoryError>> + Send;
}

/// Errors returned by [`ReservationLedger::append`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// At write time, some requested seats already had tickets for the session.
    #[error("seats already taken in session {session}: {}", error::format_seats(.seats))]
    Conflict {
        /// The session the append targeted.
        session: ShowSessionId,
        /// The conflicting seats, sorted.
        seats: Vec<Seat>,
    },

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Durable, append-only store of committed reservations.
pub trait ReservationLedger: Send + Sync {
    /// Atomically commit a reservation and one ticket per seat.
    ///
    /// Implementations must re-check that no requested seat already has a
    /// ticket for the session at the moment of the write, and must persist
    /// nothing when they reject.
    fn append(
        &self,
        reservation: NewReservation,
    ) -> impl Future<Output = Result<Reservation, LedgerError>> + Send;

    /// All tickets of a session, in ticket creation order.
    fn list_for_session(
        &self,
        session: ShowSessionId,
    ) -> impl Future<Output = Result<Vec<Ticket>, RepositoryError>> + Send;

    /// All reservations of a user, newest first.
    fn list_for_user(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<Reservation>, RepositoryError>> + Send;

    /// Look up a single reservation.
    fn get_reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = Result<Option<Reservation>, RepositoryError>> + Send;
}

//! Reservation transaction manager.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use planetarium_core::{
    Dome, DomeId, NewReservation, Reservation, ReservationId, Seat, ShowSessionId, UserId,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{
    AvailabilityIndex, BookingError, LedgerError, ReservationLedger, SeatCatalog, SeatMap,
    SeatMapRegistry, SessionGuard, SessionLocks,
};

/// Tunables for [`ReservationService`].
#[derive(Debug, Clone, Copy)]
pub struct BookingOptions {
    /// Deadline for one `create_reservation` call, lock wait included.
    pub timeout: Duration,
    /// Maximum number of domes kept in the seat map cache.
    pub dome_cache_capacity: u64,
}

impl Default for BookingOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            dome_cache_capacity: 1000,
        }
    }
}

/// Validates seat selections and commits them to the ledger.
///
/// Same-session bookings run one at a time behind [`SessionLocks`];
/// bookings for different sessions run in parallel.
pub struct ReservationService<C, L> {
    registry: Arc<SeatMapRegistry<C>>,
    index: AvailabilityIndex<C, L>,
    ledger: Arc<L>,
    locks: SessionLocks,
    options: BookingOptions,
}

impl<C: SeatCatalog, L: ReservationLedger> ReservationService<C, L> {
    /// Wire a service over a catalog and a ledger.
    pub fn new(catalog: C, ledger: L, options: BookingOptions) -> Self {
        let registry = Arc::new(SeatMapRegistry::new(catalog, options.dome_cache_capacity));
        let ledger = Arc::new(ledger);
        let index = AvailabilityIndex::new(Arc::clone(&registry), Arc::clone(&ledger));

        Self {
            registry,
            index,
            ledger,
            locks: SessionLocks::new(),
            options,
        }
    }

    /// The catalog the service reads.
    pub fn catalog(&self) -> &C {
        self.registry.catalog()
    }

    /// The availability index.
    pub const fn index(&self) -> &AvailabilityIndex<C, L> {
        &self.index
    }

    /// The ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Book `seats` of a session for `user`.
    ///
    /// Checks run in this order and stop at the first failure:
    ///
    /// 1. `seats` is non-empty (nothing is looked up before this).
    /// 2. The session exists.
    /// 3. Every seat exists in the session's dome.
    /// 4. No seat is taken.
    /// 5. No seat is requested twice.
    ///
    /// On success one ticket per seat is committed, in request order. On any
    /// failure nothing is committed.
    ///
    /// The deadline covers the lookups, the wait for the session lock and the
    /// availability checks. An append that has started always runs to
    /// completion, so a committed reservation is never reported as timed out.
    ///
    /// # Errors
    ///
    /// - `BookingError::EmptySelection` / `BookingError::DuplicateSeat`
    /// - `BookingError::SessionNotFound` / `BookingError::DomeNotFound`
    /// - `BookingError::InvalidSeat` naming the first offending seat
    /// - `BookingError::SeatConflict` listing every taken seat, sorted
    /// - `BookingError::Timeout` if the deadline passes before the append
    /// - `BookingError::Repository` on storage failure
    #[instrument(
        skip(self, seats),
        fields(user_id = %user, session_id = %session, seats = seats.len())
    )]
    pub async fn create_reservation(
        &self,
        user: UserId,
        session: ShowSessionId,
        seats: Vec<Seat>,
    ) -> Result<Reservation, BookingError> {
        if seats.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        let deadline = Instant::now() + self.options.timeout;
        let (_guard, mut draft) = self
            .within(deadline, self.prepare(user, session, &seats))
            .await?;
        let mut retried = false;

        loop {
            match self.ledger.append(draft).await {
                Ok(reservation) => {
                    info!(
                        reservation_id = %reservation.id,
                        tickets = reservation.tickets.len(),
                        "Reservation committed"
                    );
                    return Ok(reservation);
                }
                Err(LedgerError::Conflict { seats: lost, .. }) if !retried => {
                    debug!(conflicts = lost.len(), "Ledger rejected append, retrying");
                    retried = true;
                    draft = self
                        .within(deadline, self.checked_draft(user, session, &seats))
                        .await?;
                }
                Err(LedgerError::Conflict { seats: lost, .. }) => {
                    warn!(conflicts = lost.len(), "Ledger rejected append twice");
                    return Err(BookingError::SeatConflict {
                        session,
                        seats: lost,
                    });
                }
                Err(LedgerError::Repository(e)) => return Err(e.into()),
            }
        }
    }

    /// Run a pre-commit step, failing with `Timeout` once `deadline` passes.
    async fn within<T>(
        &self,
        deadline: Instant,
        step: impl Future<Output = Result<T, BookingError>>,
    ) -> Result<T, BookingError> {
        if let Ok(result) = tokio::time::timeout_at(deadline, step).await {
            result
        } else {
            let timeout = self.options.timeout;
            warn!(timeout_ms = timeout.as_millis(), "Booking timed out");
            Err(BookingError::Timeout(timeout))
        }
    }

    /// Validate the selection and take the session lock.
    async fn prepare(
        &self,
        user: UserId,
        session: ShowSessionId,
        seats: &[Seat],
    ) -> Result<(SessionGuard, NewReservation), BookingError> {
        let show_session = self.index.session(session).await?;
        let dome = self.registry.seat_space(show_session.dome).await?;

        if let Some(seat) = seats.iter().find(|s| !dome.contains(**s)) {
            return Err(BookingError::InvalidSeat {
                dome: dome.id,
                seat: *seat,
            });
        }

        let guard = self.locks.lock(session).await;
        let draft = self.checked_draft(user, session, seats).await?;
        Ok((guard, draft))
    }

    /// Build the ledger draft if none of `seats` is taken.
    async fn checked_draft(
        &self,
        user: UserId,
        session: ShowSessionId,
        seats: &[Seat],
    ) -> Result<NewReservation, BookingError> {
        let taken = self.index.taken_in(session).await?;
        let conflicts: BTreeSet<Seat> =
            seats.iter().filter(|s| taken.contains(s)).copied().collect();
        if !conflicts.is_empty() {
            warn!(conflicts = conflicts.len(), "Seats already taken");
            return Err(BookingError::SeatConflict {
                session,
                seats: conflicts.into_iter().collect(),
            });
        }

        Ok(NewReservation::new(user, session, seats.to_vec())?)
    }

    /// Seats of a session still bookable.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    pub async fn free_seats(&self, session: ShowSessionId) -> Result<BTreeSet<Seat>, BookingError> {
        self.index.free_seats(session).await
    }

    /// Seats of a session already booked.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    pub async fn taken_seats(
        &self,
        session: ShowSessionId,
    ) -> Result<BTreeSet<Seat>, BookingError> {
        self.index.taken_seats(session).await
    }

    /// Full seat map of a session.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    pub async fn seat_map(&self, session: ShowSessionId) -> Result<SeatMap, BookingError> {
        self.index.seat_map(session).await
    }

    /// Geometry of a dome.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::DomeNotFound` for an unknown dome.
    pub async fn dome(&self, id: DomeId) -> Result<Arc<Dome>, BookingError> {
        self.registry.seat_space(id).await
    }

    /// Reservations of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Repository` on storage failure.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Reservation>, BookingError> {
        Ok(self.ledger.list_for_user(user).await?)
    }

    /// A reservation owned by `user`.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::ReservationNotFound` if the reservation does not
    /// exist or belongs to someone else.
    pub async fn get_reservation(
        &self,
        user: UserId,
        id: ReservationId,
    ) -> Result<Reservation, BookingError> {
        self.ledger
            .get_reservation(id)
            .await?
            .filter(|r| r.user == user)
            .ok_or(BookingError::ReservationNotFound(id))
    }
}

//! Availability index: which seats of a session are taken.
//!
//! The index keeps no state of its own. Every call reads the ledger, so it
//! reflects commits made by any process the moment they are visible.

use std::collections::BTreeSet;
use std::sync::Arc;

use planetarium_core::{Dome, Seat, ShowSession, ShowSessionId};
use tracing::instrument;

use super::{BookingError, ReservationLedger, SeatCatalog, SeatMapRegistry};

/// Taken and free seats of one session at one point in time.
#[derive(Debug, Clone)]
pub struct SeatMap {
    /// The session.
    pub session: ShowSession,
    /// The session's dome.
    pub dome: Arc<Dome>,
    /// Seats with a ticket.
    pub taken: BTreeSet<Seat>,
    /// Seats without a ticket.
    pub free: BTreeSet<Seat>,
}

impl SeatMap {
    /// Number of seats still bookable.
    #[must_use]
    pub fn tickets_available(&self) -> usize {
        self.free.len()
    }
}

/// Derives seat availability from the ledger.
pub struct AvailabilityIndex<C, L> {
    registry: Arc<SeatMapRegistry<C>>,
    ledger: Arc<L>,
}

impl<C: SeatCatalog, L: ReservationLedger> AvailabilityIndex<C, L> {
    /// Create an index over `ledger`, resolving geometry through `registry`.
    pub const fn new(registry: Arc<SeatMapRegistry<C>>, ledger: Arc<L>) -> Self {
        Self { registry, ledger }
    }

    /// Resolve a session.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    pub async fn session(&self, id: ShowSessionId) -> Result<ShowSession, BookingError> {
        self.registry
            .catalog()
            .get_session(id)
            .await?
            .ok_or(BookingError::SessionNotFound(id))
    }

    /// Seats covered by tickets of the session.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn taken_seats(&self, id: ShowSessionId) -> Result<BTreeSet<Seat>, BookingError> {
        self.session(id).await?;
        self.taken_in(id).await
    }

    /// Seats of the session's dome without a ticket.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    /// Returns `BookingError::DomeNotFound` if the session's dome is missing.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn free_seats(&self, id: ShowSessionId) -> Result<BTreeSet<Seat>, BookingError> {
        Ok(self.seat_map(id).await?.free)
    }

    /// Session, dome, taken and free seats in one read.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SessionNotFound` for an unknown session.
    /// Returns `BookingError::DomeNotFound` if the session's dome is missing.
    pub async fn seat_map(&self, id: ShowSessionId) -> Result<SeatMap, BookingError> {
        let session = self.session(id).await?;
        let dome = self.registry.seat_space(session.dome).await?;
        let taken = self.taken_in(id).await?;
        let free = dome.seats().filter(|s| !taken.contains(s)).collect();

        Ok(SeatMap {
            session,
            dome,
            taken,
            free,
        })
    }

    /// Taken seats of a session already known to exist.
    pub(crate) async fn taken_in(&self, id: ShowSessionId) -> Result<BTreeSet<Seat>, BookingError> {
        let tickets = self.ledger.list_for_session(id).await?;
        Ok(tickets.into_iter().map(|t| t.seat).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use planetarium_core::{NewReservation, UserId};

    use super::*;
    use crate::booking::MemoryStore;

    struct Fixture {
        index: AvailabilityIndex<MemoryStore, MemoryStore>,
        store: MemoryStore,
        session: ShowSessionId,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let dome = store.insert_dome("Small Dome", None, 2, 3);
        let show = store.insert_show("Aurora", "Northern lights", 45);
        let session = store.insert_session(show.id, dome.id, Utc::now());

        let registry = Arc::new(SeatMapRegistry::new(store.clone(), 10));
        let index = AvailabilityIndex::new(registry, Arc::new(store.clone()));
        Fixture {
            index,
            store,
            session: session.id,
        }
    }

    async fn book(store: &MemoryStore, session: ShowSessionId, seats: &[(u16, u16)]) {
        let seats = seats.iter().copied().map(Seat::from).collect();
        let draft = NewReservation::new(UserId::new(1), session, seats).unwrap();
        store.append(draft).await.unwrap();
    }

    #[tokio::test]
    async fn test_fresh_session_is_all_free() {
        let f = fixture();
        assert!(f.index.taken_seats(f.session).await.unwrap().is_empty());
        assert_eq!(f.index.free_seats(f.session).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_free_and_taken_partition_the_dome() {
        let f = fixture();
        book(&f.store, f.session, &[(1, 1), (2, 3)]).await;

        let map = f.index.seat_map(f.session).await.unwrap();
        assert!(map.taken.is_disjoint(&map.free));
        let all: BTreeSet<Seat> = map.taken.union(&map.free).copied().collect();
        assert_eq!(all, map.dome.seats().collect());
        assert_eq!(map.tickets_available(), 4);
    }

    #[tokio::test]
    async fn test_taken_seats_is_stable_between_commits() {
        let f = fixture();
        book(&f.store, f.session, &[(1, 2)]).await;

        let first = f.index.taken_seats(f.session).await.unwrap();
        let second = f.index.taken_seats(f.session).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let f = fixture();
        let missing = ShowSessionId::new(999);
        assert!(matches!(
            f.index.taken_seats(missing).await,
            Err(BookingError::SessionNotFound(_))
        ));
        assert!(matches!(
            f.index.free_seats(missing).await,
            Err(BookingError::SessionNotFound(_))
        ));
    }
}

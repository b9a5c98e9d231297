//! In-process catalog and ledger.
//!
//! Used by tests and by `PLANETARIUM_STORAGE=memory`. State lives behind
//! synchronous locks that are never held across an `.await`, so every
//! append is one atomic step.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use planetarium_core::{
    AstronomyShow, AstronomyShowId, Dome, DomeId, NewReservation, Reservation, ReservationId, Seat,
    SessionFilter, ShowSession, ShowSessionId, Ticket, TicketId, UserId,
};

use super::{LedgerError, ReservationLedger, SeatCatalog};
use crate::db::RepositoryError;

#[derive(Debug, Default)]
struct Catalog {
    domes: BTreeMap<DomeId, Dome>,
    shows: BTreeMap<AstronomyShowId, AstronomyShow>,
    sessions: BTreeMap<ShowSessionId, ShowSession>,
}

#[derive(Debug, Default)]
struct Ledger {
    /// Commit order.
    reservations: Vec<Reservation>,
    taken: HashMap<ShowSessionId, HashSet<Seat>>,
    next_ticket: i32,
}

/// Memory-backed [`SeatCatalog`] and [`ReservationLedger`].
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
    ledger: Arc<Mutex<Ledger>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dome. IDs are assigned sequentially from 1.
    pub fn insert_dome(
        &self,
        name: &str,
        description: Option<&str>,
        rows: u16,
        seats_in_row: u16,
    ) -> Dome {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let dome = Dome {
            id: DomeId::new(next_id(catalog.domes.keys().last().map(DomeId::as_i32))),
            name: name.to_string(),
            description: description.map(str::to_string),
            rows,
            seats_in_row,
        };
        catalog.domes.insert(dome.id, dome.clone());
        dome
    }

    /// Add an astronomy show.
    pub fn insert_show(&self, title: &str, description: &str, duration_minutes: u32) -> AstronomyShow {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let show = AstronomyShow {
            id: AstronomyShowId::new(next_id(
                catalog.shows.keys().last().map(AstronomyShowId::as_i32),
            )),
            title: title.to_string(),
            description: description.to_string(),
            duration_minutes,
        };
        catalog.shows.insert(show.id, show.clone());
        show
    }

    /// Add a show session.
    pub fn insert_session(
        &self,
        show: AstronomyShowId,
        dome: DomeId,
        show_begin: DateTime<Utc>,
    ) -> ShowSession {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let session = ShowSession {
            id: ShowSessionId::new(next_id(
                catalog.sessions.keys().last().map(ShowSessionId::as_i32),
            )),
            astronomy_show: show,
            dome,
            show_begin,
        };
        catalog.sessions.insert(session.id, session.clone());
        session
    }

    /// Sessions matching `filter`, earliest first.
    #[must_use]
    pub fn list_sessions(&self, filter: &SessionFilter) -> Vec<ShowSession> {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        let mut sessions: Vec<ShowSession> = catalog
            .sessions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.show_begin, s.id));
        sessions
    }

    fn read_catalog<T>(&self, f: impl FnOnce(&Catalog) -> T) -> T {
        f(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn with_ledger<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        f(&mut self.ledger.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

const fn next_id(last: Option<i32>) -> i32 {
    match last {
        Some(id) => id + 1,
        None => 1,
    }
}

impl Ledger {
    fn append(&mut self, draft: &NewReservation) -> Result<Reservation, LedgerError> {
        let session = draft.show_session();
        let taken = self.taken.entry(session).or_default();

        let mut conflicts: Vec<Seat> = draft
            .seats()
            .iter()
            .filter(|s| taken.contains(s))
            .copied()
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort_unstable();
            return Err(LedgerError::Conflict {
                session,
                seats: conflicts,
            });
        }

        let reservation_id = ReservationId::new(next_id(
            self.reservations.last().map(|r| r.id.as_i32()),
        ));
        let mut tickets = Vec::with_capacity(draft.seats().len());
        for seat in draft.seats() {
            self.next_ticket += 1;
            taken.insert(*seat);
            tickets.push(Ticket {
                id: TicketId::new(self.next_ticket),
                reservation: reservation_id,
                show_session: session,
                seat: *seat,
            });
        }

        let reservation = Reservation {
            id: reservation_id,
            user: draft.user(),
            created_at: Utc::now(),
            tickets,
        };
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }
}

impl SeatCatalog for MemoryStore {
    async fn get_dome(&self, id: DomeId) -> Result<Option<Dome>, RepositoryError> {
        Ok(self.read_catalog(|c| c.domes.get(&id).cloned()))
    }

    async fn get_session(&self, id: ShowSessionId) -> Result<Option<ShowSession>, RepositoryError> {
        Ok(self.read_catalog(|c| c.sessions.get(&id).cloned()))
    }

    async fn get_show(&self, id: AstronomyShowId) -> Result<Option<AstronomyShow>, RepositoryError> {
        Ok(self.read_catalog(|c| c.shows.get(&id).cloned()))
    }
}

impl ReservationLedger for MemoryStore {
    async fn append(&self, reservation: NewReservation) -> Result<Reservation, LedgerError> {
        self.with_ledger(|ledger| ledger.append(&reservation))
    }

    async fn list_for_session(
        &self,
        session: ShowSessionId,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        Ok(self.with_ledger(|ledger| {
            ledger
                .reservations
                .iter()
                .flat_map(|r| r.tickets.iter())
                .filter(|t| t.show_session == session)
                .cloned()
                .collect()
        }))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let mut reservations: Vec<Reservation> = self.with_ledger(|ledger| {
            ledger
                .reservations
                .iter()
                .filter(|r| r.user == user)
                .cloned()
                .collect()
        });
        reservations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(reservations)
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        Ok(self.with_ledger(|ledger| {
            ledger.reservations.iter().find(|r| r.id == id).cloned()
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(user: i32, session: ShowSessionId, seats: &[(u16, u16)]) -> NewReservation {
        NewReservation::new(
            UserId::new(user),
            session,
            seats.iter().copied().map(Seat::from).collect(),
        )
        .unwrap()
    }

    fn store_with_session() -> (MemoryStore, ShowSessionId) {
        let store = MemoryStore::new();
        let dome = store.insert_dome("Small Dome", Some("Demo"), 2, 3);
        let show = store.insert_show("Aurora", "Northern lights", 45);
        let session = store.insert_session(show.id, dome.id, Utc::now());
        (store, session.id)
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_dome("A", None, 1, 1).id, DomeId::new(1));
        assert_eq!(store.insert_dome("B", None, 1, 1).id, DomeId::new(2));
        assert_eq!(
            store.get_dome(DomeId::new(2)).await.unwrap().unwrap().name,
            "B"
        );
    }

    #[tokio::test]
    async fn test_append_rejects_overlap_directly() {
        let (store, session) = store_with_session();
        store.append(draft(1, session, &[(1, 1), (1, 2)])).await.unwrap();

        let err = store
            .append(draft(2, session, &[(1, 3), (1, 2), (1, 1)]))
            .await
            .unwrap_err();
        match err {
            LedgerError::Conflict { seats, .. } => {
                assert_eq!(seats, vec![Seat::new(1, 1), Seat::new(1, 2)]);
            }
            LedgerError::Repository(e) => panic!("unexpected repository error: {e}"),
        }

        // The rejected append left nothing behind.
        assert_eq!(store.list_for_session(session).await.unwrap().len(), 2);
        assert!(store.list_for_user(UserId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = MemoryStore::new();
        let dome = store.insert_dome("Small Dome", None, 2, 3);
        let show = store.insert_show("Aurora", "", 45);
        let a = store.insert_session(show.id, dome.id, Utc::now()).id;
        let b = store.insert_session(show.id, dome.id, Utc::now()).id;

        store.append(draft(1, a, &[(1, 1)])).await.unwrap();
        store.append(draft(1, b, &[(1, 1)])).await.unwrap();

        assert_eq!(store.list_for_session(a).await.unwrap().len(), 1);
        assert_eq!(store.list_for_session(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let (store, session) = store_with_session();
        let first = store.append(draft(1, session, &[(1, 1)])).await.unwrap();
        let second = store.append(draft(1, session, &[(2, 2)])).await.unwrap();
        store.append(draft(2, session, &[(2, 3)])).await.unwrap();

        let ids: Vec<ReservationId> = store
            .list_for_user(UserId::new(1))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_ticket_ids_follow_request_order() {
        let (store, session) = store_with_session();
        let reservation = store
            .append(draft(1, session, &[(2, 1), (1, 1)]))
            .await
            .unwrap();

        assert_eq!(reservation.tickets[0].id, TicketId::new(1));
        assert_eq!(reservation.tickets[0].seat, Seat::new(2, 1));
        assert_eq!(reservation.tickets[1].id, TicketId::new(2));
        assert_eq!(
            store.get_reservation(reservation.id).await.unwrap(),
            Some(reservation)
        );
    }

    #[test]
    fn test_list_sessions_filters_and_sorts() {
        use chrono::TimeZone;

        let store = MemoryStore::new();
        let small = store.insert_dome("Small Dome", None, 1, 1);
        let main = store.insert_dome("Main Hall", None, 2, 2);
        let aurora = store.insert_show("Aurora", "", 45);
        let comets = store.insert_show("Comets", "", 30);
        let day = |d, h| Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap();

        let late = store.insert_session(aurora.id, small.id, day(1, 20));
        let early = store.insert_session(aurora.id, main.id, day(1, 18));
        let next_day = store.insert_session(comets.id, small.id, day(2, 18));

        let ids = |filter: SessionFilter| -> Vec<ShowSessionId> {
            store.list_sessions(&filter).into_iter().map(|s| s.id).collect()
        };

        assert_eq!(ids(SessionFilter::default()), vec![early.id, late.id, next_day.id]);
        assert_eq!(
            ids(SessionFilter {
                astronomy_show: Some(aurora.id),
                ..SessionFilter::default()
            }),
            vec![early.id, late.id]
        );
        assert_eq!(
            ids(SessionFilter {
                planetarium_dome: Some(small.id),
                date: chrono::NaiveDate::from_ymd_opt(2026, 3, 2),
                ..SessionFilter::default()
            }),
            vec![next_day.id]
        );
    }
}

//! Reservations and the tickets they hold.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ReservationId, ShowSessionId, TicketId, UserId};
use super::seat::Seat;

/// Errors that can occur when assembling a [`NewReservation`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// No seats were selected.
    #[error("at least one seat must be selected")]
    Empty,
    /// The same seat was selected more than once.
    #[error("{0} was selected more than once")]
    Duplicate(Seat),
}

/// A single seat claim for one show session.
///
/// Serializes as `{"id": 1, "reservation": 1, "show_session": 1, "row": 1, "seat": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket ID.
    pub id: TicketId,
    /// The reservation this ticket belongs to.
    pub reservation: ReservationId,
    /// The session this ticket admits to.
    pub show_session: ShowSessionId,
    /// The claimed seat.
    #[serde(flatten)]
    pub seat: Seat,
}

/// A committed booking: one user, one session, one or more tickets.
///
/// Reservations are immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation ID.
    pub id: ReservationId,
    /// The user who made the booking.
    pub user: UserId,
    /// When the reservation was committed.
    pub created_at: DateTime<Utc>,
    /// Tickets in the order the seats were requested.
    pub tickets: Vec<Ticket>,
}

impl Reservation {
    /// The session all tickets of this reservation admit to.
    ///
    /// Returns `None` only for a reservation without tickets, which the
    /// booking engine never commits.
    #[must_use]
    pub fn show_session(&self) -> Option<ShowSessionId> {
        self.tickets.first().map(|t| t.show_session)
    }

    /// Seats held by this reservation, in ticket order.
    pub fn seats(&self) -> impl Iterator<Item = Seat> + '_ {
        self.tickets.iter().map(|t| t.seat)
    }
}

/// A validated reservation that has not been committed yet.
///
/// Guarantees a non-empty seat list without duplicates, all for one session.
/// IDs and the creation timestamp are assigned by the ledger on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    user: UserId,
    show_session: ShowSessionId,
    seats: Vec<Seat>,
}

impl NewReservation {
    /// Assemble a reservation draft.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Empty` if `seats` is empty.
    /// Returns `SelectionError::Duplicate` with the first repeated seat.
    pub fn new(
        user: UserId,
        show_session: ShowSessionId,
        seats: Vec<Seat>,
    ) -> Result<Self, SelectionError> {
        if seats.is_empty() {
            return Err(SelectionError::Empty);
        }

        let mut seen = HashSet::with_capacity(seats.len());
        if let Some(dup) = seats.iter().find(|s| !seen.insert(**s)) {
            return Err(SelectionError::Duplicate(*dup));
        }

        Ok(Self {
            user,
            show_session,
            seats,
        })
    }

    /// The booking user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// The target session.
    #[must_use]
    pub const fn show_session(&self) -> ShowSessionId {
        self.show_session
    }

    /// Requested seats, in request order.
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }
}

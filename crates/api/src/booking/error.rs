//! Booking error taxonomy.

use std::time::Duration;

use planetarium_core::{DomeId, ReservationId, Seat, SelectionError, ShowSessionId};
use thiserror::Error;

use crate::db::RepositoryError;

/// Coarse classification of a [`BookingError`].
///
/// The HTTP layer maps each kind onto one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request (empty selection, duplicated seat).
    InvalidRequest,
    /// Referenced dome, session or reservation does not exist.
    NotFound,
    /// A seat lies outside the dome's seat grid.
    InvalidSeat,
    /// A seat is already taken for the session.
    SeatConflict,
    /// The booking did not finish before its deadline.
    Timeout,
    /// Storage failure.
    Storage,
}

impl ErrorKind {
    /// Stable machine-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::InvalidSeat => "invalid_seat",
            Self::SeatConflict => "seat_conflict",
            Self::Timeout => "timeout",
            Self::Storage => "storage",
        }
    }
}

/// Errors returned by the booking engine.
#[derive(Debug, Error)]
pub enum BookingError {
    /// No seats were selected.
    #[error("at least one seat must be selected")]
    EmptySelection,

    /// The same seat appears more than once in the request.
    #[error("{0} was selected more than once")]
    DuplicateSeat(Seat),

    /// Unknown dome.
    #[error("dome {0} not found")]
    DomeNotFound(DomeId),

    /// Unknown show session.
    #[error("show session {0} not found")]
    SessionNotFound(ShowSessionId),

    /// Unknown reservation, or one owned by another user.
    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// A seat lies outside the dome's seat grid.
    #[error("{seat} does not exist in dome {dome}")]
    InvalidSeat {
        /// The session's dome.
        dome: DomeId,
        /// First offending seat in request order.
        seat: Seat,
    },

    /// Coordinates outside the range any dome can have.
    #[error("row {row}, seat {seat} does not exist in any dome")]
    SeatOutOfRange {
        /// Requested row.
        row: i64,
        /// Requested seat number.
        seat: i64,
    },

    /// Seats are already taken for the session.
    #[error("seats already taken in session {session}: {}", format_seats(.seats))]
    SeatConflict {
        /// The requested session.
        session: ShowSessionId,
        /// All conflicting seats, sorted.
        seats: Vec<Seat>,
    },

    /// The booking did not complete in time; nothing was persisted.
    #[error("booking did not complete within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BookingError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySelection | Self::DuplicateSeat(_) => ErrorKind::InvalidRequest,
            Self::DomeNotFound(_) | Self::SessionNotFound(_) | Self::ReservationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidSeat { .. } | Self::SeatOutOfRange { .. } => ErrorKind::InvalidSeat,
            Self::SeatConflict { .. } => ErrorKind::SeatConflict,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Repository(_) => ErrorKind::Storage,
        }
    }

    /// Seats named by this error, if any.
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        match self {
            Self::DuplicateSeat(seat) | Self::InvalidSeat { seat, .. } => {
                std::slice::from_ref(seat)
            }
            Self::SeatConflict { seats, .. } => seats,
            _ => &[],
        }
    }
}

impl From<SelectionError> for BookingError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::Empty => Self::EmptySelection,
            SelectionError::Duplicate(seat) => Self::DuplicateSeat(seat),
        }
    }
}

/// Render seats as `(1, 2), (1, 3)`.
pub(crate) fn format_seats(seats: &[Seat]) -> String {
    seats
        .iter()
        .map(|s| format!("({}, {})", s.row, s.number))
        .collect::<Vec<_>>()
        .join(", ")
}

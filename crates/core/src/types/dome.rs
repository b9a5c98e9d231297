//! Planetarium domes and their seating plans.

use serde::{Deserialize, Serialize};

use super::id::DomeId;
use super::seat::Seat;

/// A planetarium dome with a rectangular seat grid.
///
/// The geometry (`rows` x `seats_in_row`) must not change once show sessions
/// reference the dome: renumbering would invalidate issued tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dome {
    /// Unique dome ID.
    pub id: DomeId,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Number of seat rows.
    pub rows: u16,
    /// Number of seats in every row.
    pub seats_in_row: u16,
}

impl Dome {
    /// Largest supported number of rows.
    pub const MAX_ROWS: u16 = 100;

    /// Largest supported number of seats in a row.
    pub const MAX_SEATS_IN_ROW: u16 = 100;

    /// Whether a `rows` x `seats_in_row` grid is non-empty and within the
    /// supported limits.
    #[must_use]
    pub const fn is_supported_geometry(rows: u16, seats_in_row: u16) -> bool {
        rows >= 1
            && rows <= Self::MAX_ROWS
            && seats_in_row >= 1
            && seats_in_row <= Self::MAX_SEATS_IN_ROW
    }

    /// Total number of seats.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.rows as u32 * self.seats_in_row as u32
    }

    /// Whether `(row, seat_number)` lies inside this dome's seat grid.
    #[must_use]
    pub const fn is_valid_seat(&self, row: u16, seat_number: u16) -> bool {
        row >= 1 && row <= self.rows && seat_number >= 1 && seat_number <= self.seats_in_row
    }

    /// Whether `seat` lies inside this dome's seat grid.
    #[must_use]
    pub const fn contains(&self, seat: Seat) -> bool {
        self.is_valid_seat(seat.row, seat.number)
    }

    /// Every seat of the dome in row-major order.
    pub fn seats(&self) -> impl Iterator<Item = Seat> + use<> {
        let seats_in_row = self.seats_in_row;
        (1..=self.rows).flat_map(move |row| (1..=seats_in_row).map(move |n| Seat::new(row, n)))
    }
}

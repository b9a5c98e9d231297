//! Seat coordinates within a dome.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Seat`] from untyped integers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatError {
    /// A coordinate does not fit the seat coordinate range.
    #[error("{field} {value} is out of range (1..={max})")]
    OutOfRange {
        /// Which coordinate was rejected (`row` or `seat`).
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Largest accepted value.
        max: u16,
    },
}

/// A `(row, seat_number)` coordinate.
///
/// Rows and seat numbers are 1-based. A seat is only meaningful relative to a
/// [`Dome`](crate::Dome); use [`Dome::contains`](crate::Dome::contains) to
/// check it against a seating plan.
///
/// Seats order row-major: first by row, then by seat number.
///
/// Serializes as `{"row": 1, "seat": 2}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Seat {
    /// Row number, starting at 1.
    pub row: u16,
    /// Seat number within the row, starting at 1.
    #[serde(rename = "seat")]
    pub number: u16,
}

impl Seat {
    /// Create a seat coordinate.
    #[must_use]
    pub const fn new(row: u16, number: u16) -> Self {
        Self { row, number }
    }

    /// Build a seat from database integers.
    ///
    /// # Errors
    ///
    /// Returns `SeatError::OutOfRange` if either value is below 1 or above
    /// `u16::MAX`.
    pub fn from_i32(row: i32, number: i32) -> Result<Self, SeatError> {
        Ok(Self {
            row: coordinate("row", row)?,
            number: coordinate("seat", number)?,
        })
    }
}

fn coordinate(field: &'static str, value: i32) -> Result<u16, SeatError> {
    u16::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or(SeatError::OutOfRange {
            field,
            value: i64::from(value),
            max: u16::MAX,
        })
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, seat {}", self.row, self.number)
    }
}

impl From<(u16, u16)> for Seat {
    fn from((row, number): (u16, u16)) -> Self {
        Self::new(row, number)
    }
}

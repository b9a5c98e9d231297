//! Core domain types for planetarium booking.
//!
//! This module provides type-safe wrappers for the booking domain.

pub mod dome;
pub mod id;
pub mod reservation;
pub mod seat;
pub mod session;

pub use dome::Dome;
pub use id::*;
pub use reservation::{NewReservation, Reservation, SelectionError, Ticket};
pub use seat::{Seat, SeatError};
pub use session::{AstronomyShow, SessionFilter, ShowSession};

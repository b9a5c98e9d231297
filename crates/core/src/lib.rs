//! Planetarium Core - Shared domain types.
//!
//! This crate provides the types used across all planetarium components:
//! - `api` - Booking engine and JSON HTTP API
//! - `cli` - Command-line tools for migrations, seeding and seat maps
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, seats, domes, show sessions, reservations and tickets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

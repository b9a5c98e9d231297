//! Planetarium booking API library.
//!
//! Seat reservation engine ([`booking`]), its storage backends ([`db`],
//! [`booking::memory`]) and the JSON API on top ([`routes`]). The binary in
//! `main.rs` only wires configuration, logging and transport layers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod state;
pub mod storage;

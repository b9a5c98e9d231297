//! Integration tests for the planetarium booking service.
//!
//! # Running Tests
//!
//! ```bash
//! # Memory-backed tests (no external services)
//! cargo test -p planetarium-integration-tests
//!
//! # PostgreSQL ledger tests
//! PLANETARIUM_TEST_DATABASE_URL=postgres://localhost/planetarium_test \
//!     cargo test -p planetarium-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `booking_scenarios` - booking engine behaviour and concurrency
//! - `http_api` - JSON API driven through the router with `oneshot`
//! - `postgres_ledger` - `PostgreSQL` backend (ignored by default)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeDelta, Utc};
use serde_json::Value;
use tower::ServiceExt;

use planetarium_api::booking::{BookingOptions, MemoryStore, ReservationService};
use planetarium_api::config::ApiConfig;
use planetarium_api::middleware::USER_ID_HEADER;
use planetarium_api::routes;
use planetarium_api::state::AppState;
use planetarium_api::storage::Storage;
use planetarium_core::{DomeId, Seat, ShowSessionId};

/// A memory store holding one dome and one session of that dome.
pub struct Fixture {
    pub store: MemoryStore,
    pub dome: DomeId,
    pub session: ShowSessionId,
}

impl Fixture {
    /// Dome of `rows` x `seats_in_row` with one session tomorrow.
    #[must_use]
    pub fn new(rows: u16, seats_in_row: u16) -> Self {
        let store = MemoryStore::new();
        let dome = store.insert_dome("Test Dome", None, rows, seats_in_row);
        let show = store.insert_show("Test Show", "Integration fixture", 50);
        let session = store.insert_session(show.id, dome.id, Utc::now() + TimeDelta::days(1));
        Self {
            store,
            dome: dome.id,
            session: session.id,
        }
    }

    /// Booking service over the fixture's store.
    #[must_use]
    pub fn service(&self) -> ReservationService<MemoryStore, MemoryStore> {
        ReservationService::new(
            self.store.clone(),
            self.store.clone(),
            BookingOptions::default(),
        )
    }

    /// Router over the fixture's store.
    #[must_use]
    pub fn router(&self) -> Router {
        let config =
            ApiConfig::from_lookup(|key| (key == "PLANETARIUM_STORAGE").then(|| "memory".into()))
                .unwrap();
        routes::router(AppState::new(&config, Storage::memory(self.store.clone())))
    }
}

/// Build seats from `(row, seat)` pairs.
#[must_use]
pub fn seats(pairs: &[(u16, u16)]) -> Vec<Seat> {
    pairs.iter().copied().map(Seat::from).collect()
}

/// Send one request through `router` and decode the JSON response.
///
/// Non-JSON bodies decode to `Value::String`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    user: Option<i32>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

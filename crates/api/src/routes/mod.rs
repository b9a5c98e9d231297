//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (storage reachable)
//!
//! # Catalog (read-only)
//! GET  /api/planetarium_domes/{id}      - Dome geometry and capacity
//! GET  /api/show_sessions               - Sessions, filtered by show, dome or date
//! GET  /api/show_sessions/{id}          - Session with availability summary
//! GET  /api/show_sessions/{id}/seats    - Taken and free seats
//!
//! # Reservations (requires x-user-id)
//! GET  /api/reservations                - Caller's reservations, newest first
//! POST /api/reservations                - Book seats
//! GET  /api/reservations/{id}           - One of the caller's reservations
//! ```

pub mod domes;
pub mod health;
pub mod reservations;
pub mod show_sessions;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::get,
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// JSON API routes, to be nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/planetarium_domes/{id}", get(domes::show))
        .route("/show_sessions", get(show_sessions::index))
        .route("/show_sessions/{id}", get(show_sessions::show))
        .route("/show_sessions/{id}/seats", get(show_sessions::seats))
        .route(
            "/reservations",
            get(reservations::index).post(reservations::create),
        )
        .route("/reservations/{id}", get(reservations::show))
}

/// The full application router without transport-level layers.
///
/// The binary adds tracing, request IDs, rate limiting and Sentry on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .nest("/api", api_routes())
        .with_state(state)
}

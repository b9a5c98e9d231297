//! Show session handlers.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use planetarium_core::{AstronomyShowId, Seat, SessionFilter, ShowSessionId};
use serde::Serialize;

use super::ApiQuery;
use super::domes::DomeResponse;
use crate::booking::SeatCatalog;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Show summary embedded in a session.
#[derive(Debug, Serialize)]
pub struct ShowSummary {
    pub id: AstronomyShowId,
    pub title: String,
    pub duration_minutes: u32,
}

/// One row of the session listing.
#[derive(Debug, Serialize)]
pub struct SessionListItem {
    pub id: ShowSessionId,
    pub show_begin: DateTime<Utc>,
    pub astronomy_show_title: String,
    pub planetarium_dome_name: String,
    pub planetarium_dome_capacity: u32,
    pub tickets_available: usize,
}

/// Session detail with availability.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: ShowSessionId,
    pub astronomy_show: ShowSummary,
    pub planetarium_dome: DomeResponse,
    pub show_begin: DateTime<Utc>,
    pub show_end: DateTime<Utc>,
    pub tickets_available: usize,
    pub taken_places: Vec<Seat>,
}

/// Seat availability of a session.
#[derive(Debug, Serialize)]
pub struct SeatsResponse {
    pub show_session: ShowSessionId,
    pub capacity: u32,
    pub taken: Vec<Seat>,
    pub free: Vec<Seat>,
}

/// List sessions, earliest first.
///
/// GET /api/show_sessions?astronomy_show=&planetarium_dome=&date=YYYY-MM-DD
///
/// # Errors
///
/// Returns 400 for a malformed filter.
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SessionFilter>,
) -> Result<Json<Vec<SessionListItem>>> {
    let sessions = state.storage().list_sessions(&filter).await?;
    let mut titles: HashMap<AstronomyShowId, String> = HashMap::new();
    let mut items = Vec::with_capacity(sessions.len());

    for session in sessions {
        let show_id = session.astronomy_show;
        let title = if let Some(title) = titles.get(&show_id) {
            title.clone()
        } else {
            let show = state.booking().catalog().get_show(show_id).await?.ok_or_else(|| {
                AppError::Internal(format!(
                    "session {} references missing show {show_id}",
                    session.id
                ))
            })?;
            titles.insert(show_id, show.title.clone());
            show.title
        };

        let map = state.booking().seat_map(session.id).await?;
        items.push(SessionListItem {
            id: session.id,
            show_begin: session.show_begin,
            astronomy_show_title: title,
            planetarium_dome_name: map.dome.name.clone(),
            planetarium_dome_capacity: map.dome.capacity(),
            tickets_available: map.tickets_available(),
        });
    }

    Ok(Json(items))
}

/// Get one session with its show, dome and taken seats.
///
/// GET /api/show_sessions/{id}
///
/// # Errors
///
/// Returns 404 for an unknown session.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ShowSessionId>,
) -> Result<Json<SessionResponse>> {
    let map = state.booking().seat_map(id).await?;

    let show_id = map.session.astronomy_show;
    let show = state
        .booking()
        .catalog()
        .get_show(show_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("session {id} references missing show {show_id}"))
        })?;

    Ok(Json(SessionResponse {
        id: map.session.id,
        show_end: map.session.show_end(&show),
        show_begin: map.session.show_begin,
        astronomy_show: ShowSummary {
            id: show.id,
            title: show.title,
            duration_minutes: show.duration_minutes,
        },
        planetarium_dome: DomeResponse::from(map.dome.as_ref()),
        tickets_available: map.tickets_available(),
        taken_places: map.taken.into_iter().collect(),
    }))
}

/// Get the taken and free seats of a session, both row-major.
///
/// GET /api/show_sessions/{id}/seats
///
/// # Errors
///
/// Returns 404 for an unknown session.
pub async fn seats(
    State(state): State<AppState>,
    Path(id): Path<ShowSessionId>,
) -> Result<Json<SeatsResponse>> {
    let map = state.booking().seat_map(id).await?;

    Ok(Json(SeatsResponse {
        show_session: id,
        capacity: map.dome.capacity(),
        taken: map.taken.into_iter().collect(),
        free: map.free.into_iter().collect(),
    }))
}

//! Planetarium dome handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use planetarium_core::{Dome, DomeId};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Dome as returned by the API.
#[derive(Debug, Serialize)]
pub struct DomeResponse {
    pub id: DomeId,
    pub name: String,
    pub description: Option<String>,
    pub rows: u16,
    pub seats_in_row: u16,
    pub capacity: u32,
}

impl From<&Dome> for DomeResponse {
    fn from(dome: &Dome) -> Self {
        Self {
            id: dome.id,
            name: dome.name.clone(),
            description: dome.description.clone(),
            rows: dome.rows,
            seats_in_row: dome.seats_in_row,
            capacity: dome.capacity(),
        }
    }
}

/// Get one dome.
///
/// GET /api/planetarium_domes/{id}
///
/// # Errors
///
/// Returns 404 for an unknown dome.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<DomeId>,
) -> Result<Json<DomeResponse>> {
    let dome = state.booking().dome(id).await?;
    Ok(Json(DomeResponse::from(dome.as_ref())))
}

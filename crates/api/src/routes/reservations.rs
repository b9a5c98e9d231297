//! Reservation handlers.
//!
//! Every handler requires the caller's identity and only ever exposes the
//! caller's own reservations.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use planetarium_core::{Reservation, ReservationId, Seat, ShowSessionId};
use serde::{Deserialize, Serialize};

use super::{ApiJson, ApiQuery};
use crate::booking::BookingError;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

// =============================================================================
// Listing
// =============================================================================

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<T>,
}

impl PageParams {
    /// Validated `(page, page_size)`.
    fn resolve(&self) -> Result<(usize, usize)> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::BadRequest("page must be at least 1".to_string()));
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::BadRequest(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok((page, page_size))
    }
}

/// Slice `items` into the requested page.
fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Result<Page<T>> {
    let count = items.len();
    let offset = (page - 1).saturating_mul(page_size);
    if page > 1 && offset >= count {
        return Err(AppError::NotFound(format!("page {page}")));
    }

    Ok(Page {
        count,
        page,
        page_size,
        results: items.into_iter().skip(offset).take(page_size).collect(),
    })
}

/// List the caller's reservations, newest first.
///
/// GET /api/reservations?page=&page_size=
///
/// # Errors
///
/// Returns 400 for invalid pagination, 404 for a page past the end.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Reservation>>> {
    let (page, page_size) = params.resolve()?;
    let reservations = state.booking().list_for_user(user).await?;
    Ok(Json(paginate(reservations, page, page_size)?))
}

// =============================================================================
// Booking
// =============================================================================

/// One requested ticket.
///
/// Coordinates are read as plain integers so that negative or oversized
/// values are reported as invalid seats rather than malformed JSON.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TicketRequest {
    pub show_session: ShowSessionId,
    pub row: i64,
    pub seat: i64,
}

impl TicketRequest {
    fn seat(self) -> std::result::Result<Seat, BookingError> {
        match (u16::try_from(self.row), u16::try_from(self.seat)) {
            (Ok(row), Ok(number)) => Ok(Seat::new(row, number)),
            _ => Err(BookingError::SeatOutOfRange {
                row: self.row,
                seat: self.seat,
            }),
        }
    }
}

/// Body of `POST /api/reservations`.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub tickets: Vec<TicketRequest>,
}

impl CreateReservationRequest {
    /// Split into the single target session and the seat list.
    fn into_selection(self) -> Result<(ShowSessionId, Vec<Seat>)> {
        let Some(first) = self.tickets.first() else {
            return Err(BookingError::EmptySelection.into());
        };
        let session = first.show_session;

        if self.tickets.iter().any(|t| t.show_session != session) {
            return Err(AppError::BadRequest(
                "all tickets of a reservation must be for the same show session".to_string(),
            ));
        }

        let seats = self
            .tickets
            .into_iter()
            .map(TicketRequest::seat)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((session, seats))
    }
}

/// Book seats for the caller.
///
/// POST /api/reservations
///
/// ```json
/// {"tickets": [{"show_session": 1, "row": 1, "seat": 2}]}
/// ```
///
/// # Errors
///
/// - 400 for an empty, duplicated, out-of-dome or multi-session selection
/// - 404 for an unknown session
/// - 409 if a seat is already taken
/// - 503 if the booking timed out
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(request): ApiJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let (session, seats) = request.into_selection()?;
    let reservation = state
        .booking()
        .create_reservation(user, session, seats)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Get one of the caller's reservations.
///
/// GET /api/reservations/{id}
///
/// # Errors
///
/// Returns 404 if the reservation does not exist or belongs to another user.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.booking().get_reservation(user, id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ticket(session: i32, row: i64, seat: i64) -> TicketRequest {
        TicketRequest {
            show_session: ShowSessionId::new(session),
            row,
            seat,
        }
    }

    #[test]
    fn test_page_params_defaults() {
        assert_eq!(PageParams::default().resolve().unwrap(), (1, 20));
    }

    #[test]
    fn test_page_params_rejects_out_of_range() {
        let zero_page = PageParams {
            page: Some(0),
            page_size: None,
        };
        assert!(matches!(zero_page.resolve(), Err(AppError::BadRequest(_))));

        let huge = PageParams {
            page: None,
            page_size: Some(101),
        };
        assert!(matches!(huge.resolve(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=45).collect::<Vec<_>>(), 3, 20).unwrap();
        assert_eq!(page.count, 45);
        assert_eq!(page.results, (41..=45).collect::<Vec<_>>());

        let empty = paginate(Vec::<i32>::new(), 1, 20).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.results.is_empty());

        assert!(matches!(
            paginate((1..=5).collect::<Vec<_>>(), 2, 5),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_into_selection() {
        let request = CreateReservationRequest {
            tickets: vec![ticket(4, 1, 2), ticket(4, 1, 3)],
        };
        let (session, seats) = request.into_selection().unwrap();
        assert_eq!(session, ShowSessionId::new(4));
        assert_eq!(seats, vec![Seat::new(1, 2), Seat::new(1, 3)]);
    }

    #[test]
    fn test_into_selection_rejects_mixed_sessions() {
        let request = CreateReservationRequest {
            tickets: vec![ticket(4, 1, 2), ticket(5, 1, 3)],
        };
        assert!(matches!(
            request.into_selection(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_into_selection_rejects_empty() {
        let request = CreateReservationRequest { tickets: vec![] };
        assert!(matches!(
            request.into_selection(),
            Err(AppError::Booking(BookingError::EmptySelection))
        ));
    }

    #[test]
    fn test_into_selection_rejects_out_of_range_coordinates() {
        for (row, seat) in [(-1, 1), (70_000, 1), (1, 0x1_0000)] {
            let request = CreateReservationRequest {
                tickets: vec![ticket(4, 1, 1), ticket(4, row, seat)],
            };
            assert!(matches!(
                request.into_selection(),
                Err(AppError::Booking(BookingError::SeatOutOfRange { .. }))
            ));
        }
    }

    #[test]
    fn test_request_json_shape() {
        let request: CreateReservationRequest = serde_json::from_str(
            r#"{"tickets": [{"show_session": 1, "row": 1, "seat": 2}]}"#,
        )
        .unwrap();
        assert_eq!(request.tickets.len(), 1);
        assert_eq!(request.tickets[0].seat, 2);
    }
}

//! Reservation ledger backed by `PostgreSQL`.
//!
//! # Append protocol
//!
//! Each append runs in one transaction:
//!
//! 1. `pg_advisory_xact_lock(LOCK_CLASS, session_id)` serializes appends for
//!    the same session across all API processes. Other sessions use other
//!    lock keys and never wait.
//! 2. A pre-check query reports every requested seat that already has a
//!    ticket, so the caller gets the full conflict list.
//! 3. The reservation row and its tickets are inserted.
//!
//! The unique index `ticket_session_seat_key` is the last line: a violation
//! is reported as a conflict and the transaction rolls back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use planetarium_core::{
    NewReservation, Reservation, ReservationId, Seat, ShowSessionId, Ticket, TicketId, UserId,
};

use super::RepositoryError;
use crate::booking::{LedgerError, ReservationLedger};

/// First key of the advisory lock pair. The second key is the session ID.
const LOCK_CLASS: i32 = 0x504C_4E54;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i32,
    reservation_id: i32,
    show_session_id: i32,
    row_number: i32,
    seat_number: i32,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let seat = Seat::from_i32(row.row_number, row.seat_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid seat on ticket {}: {e}", row.id))
        })?;

        Ok(Self {
            id: TicketId::new(row.id),
            reservation: ReservationId::new(row.reservation_id),
            show_session: ShowSessionId::new(row.show_session_id),
            seat,
        })
    }
}

/// One ticket joined with its reservation header.
#[derive(Debug, sqlx::FromRow)]
struct ReservationTicketRow {
    reservation_id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    ticket_id: i32,
    show_session_id: i32,
    row_number: i32,
    seat_number: i32,
}

/// Fold rows ordered by reservation into reservations, keeping row order.
fn group_reservations(
    rows: Vec<ReservationTicketRow>,
) -> Result<Vec<Reservation>, RepositoryError> {
    let mut reservations: Vec<Reservation> = Vec::new();

    for row in rows {
        let ticket = Ticket::try_from(TicketRow {
            id: row.ticket_id,
            reservation_id: row.reservation_id,
            show_session_id: row.show_session_id,
            row_number: row.row_number,
            seat_number: row.seat_number,
        })?;

        match reservations.last_mut() {
            Some(current) if current.id.as_i32() == row.reservation_id => {
                current.tickets.push(ticket);
            }
            _ => reservations.push(Reservation {
                id: ReservationId::new(row.reservation_id),
                user: UserId::new(row.user_id),
                created_at: row.created_at,
                tickets: vec![ticket],
            }),
        }
    }

    Ok(reservations)
}

fn seat_columns(seats: &[Seat]) -> (Vec<i32>, Vec<i32>) {
    seats
        .iter()
        .map(|s| (i32::from(s.row), i32::from(s.number)))
        .unzip()
}

fn seats_from_rows(rows: Vec<(i32, i32)>) -> Result<Vec<Seat>, RepositoryError> {
    rows.into_iter()
        .map(|(row, number)| {
            Seat::from_i32(row, number)
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid seat: {e}")))
        })
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` reservation ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Commit a reservation and its tickets in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Conflict` if any seat already has a ticket for
    /// the session; nothing is written in that case.
    /// Returns `LedgerError::Repository` if the database fails.
    #[instrument(
        skip(self, reservation),
        fields(
            session_id = %reservation.show_session(),
            user_id = %reservation.user(),
            seats = reservation.seats().len()
        )
    )]
    pub async fn append(&self, reservation: NewReservation) -> Result<Reservation, LedgerError> {
        let session = reservation.show_session();
        let (rows, numbers) = seat_columns(reservation.seats());

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(LOCK_CLASS)
            .bind(session)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        let taken = sqlx::query_as::<_, (i32, i32)>(
            r"
            SELECT row_number, seat_number
            FROM planetarium.ticket
            WHERE show_session_id = $1
              AND (row_number, seat_number) IN (
                  SELECT * FROM UNNEST($2::int4[], $3::int4[])
              )
            ORDER BY row_number, seat_number
            ",
        )
        .bind(session)
        .bind(&rows)
        .bind(&numbers)
        .fetch_all(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        if !taken.is_empty() {
            return Err(LedgerError::Conflict {
                session,
                seats: seats_from_rows(taken)?,
            });
        }

        let (id, created_at) = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r"
            INSERT INTO planetarium.reservation (user_id)
            VALUES ($1)
            RETURNING id, created_at
            ",
        )
        .bind(reservation.user())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let inserted = sqlx::query_as::<_, (i32, i32, i32)>(
            r"
            INSERT INTO planetarium.ticket (reservation_id, show_session_id, row_number, seat_number)
            SELECT $1, $2, t.row_number, t.seat_number
            FROM UNNEST($3::int4[], $4::int4[]) WITH ORDINALITY AS t(row_number, seat_number, ord)
            ORDER BY t.ord
            RETURNING id, row_number, seat_number
            ",
        )
        .bind(id)
        .bind(session)
        .bind(&rows)
        .bind(&numbers)
        .fetch_all(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(rows) => rows,
            Err(e) => {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    let mut seats = reservation.seats().to_vec();
                    seats.sort_unstable();
                    return Err(LedgerError::Conflict { session, seats });
                }
                return Err(RepositoryError::Database(e).into());
            }
        };

        tx.commit().await.map_err(RepositoryError::from)?;

        let ticket_ids: HashMap<(i32, i32), i32> = inserted
            .into_iter()
            .map(|(ticket_id, row, number)| ((row, number), ticket_id))
            .collect();

        let tickets = reservation
            .seats()
            .iter()
            .map(|seat| {
                let key = (i32::from(seat.row), i32::from(seat.number));
                let ticket_id = ticket_ids.get(&key).copied().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("no ticket returned for {seat}"))
                })?;
                Ok(Ticket {
                    id: TicketId::new(ticket_id),
                    reservation: ReservationId::new(id),
                    show_session: session,
                    seat: *seat,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Reservation {
            id: ReservationId::new(id),
            user: reservation.user(),
            created_at,
            tickets,
        })
    }

    /// All tickets of a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored seat is invalid.
    #[instrument(skip(self), fields(session_id = %session))]
    pub async fn list_for_session(
        &self,
        session: ShowSessionId,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r"
            SELECT id, reservation_id, show_session_id, row_number, seat_number
            FROM planetarium.ticket
            WHERE show_session_id = $1
            ORDER BY id
            ",
        )
        .bind(session)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// All reservations of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored seat is invalid.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReservationTicketRow>(
            r"
            SELECT r.id AS reservation_id, r.user_id, r.created_at,
                   t.id AS ticket_id, t.show_session_id, t.row_number, t.seat_number
            FROM planetarium.reservation r
            JOIN planetarium.ticket t ON t.reservation_id = r.id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC, t.id
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        group_reservations(rows)
    }

    /// Get a reservation with its tickets.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored seat is invalid.
    #[instrument(skip(self), fields(reservation_id = %id))]
    pub async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReservationTicketRow>(
            r"
            SELECT r.id AS reservation_id, r.user_id, r.created_at,
                   t.id AS ticket_id, t.show_session_id, t.row_number, t.seat_number
            FROM planetarium.reservation r
            JOIN planetarium.ticket t ON t.reservation_id = r.id
            WHERE r.id = $1
            ORDER BY t.id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_reservations(rows)?.into_iter().next())
    }
}

impl ReservationLedger for LedgerRepository {
    async fn append(&self, reservation: NewReservation) -> Result<Reservation, LedgerError> {
        Self::append(self, reservation).await
    }

    async fn list_for_session(
        &self,
        session: ShowSessionId,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        Self::list_for_session(self, session).await
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        Self::list_for_user(self, user).await
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        Self::get_reservation(self, id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(reservation_id: i32, ticket_id: i32, seat: (i32, i32)) -> ReservationTicketRow {
        ReservationTicketRow {
            reservation_id,
            user_id: 1,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            ticket_id,
            show_session_id: 4,
            row_number: seat.0,
            seat_number: seat.1,
        }
    }

    #[test]
    fn test_group_reservations_keeps_order() {
        let grouped = group_reservations(vec![
            row(9, 20, (1, 1)),
            row(9, 21, (1, 2)),
            row(5, 10, (2, 3)),
        ])
        .unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, ReservationId::new(9));
        assert_eq!(
            grouped[0].seats().collect::<Vec<_>>(),
            vec![Seat::new(1, 1), Seat::new(1, 2)]
        );
        assert_eq!(grouped[1].id, ReservationId::new(5));
        assert_eq!(grouped[1].tickets[0].id, TicketId::new(10));
    }

    #[test]
    fn test_group_reservations_rejects_corrupt_seat() {
        let result = group_reservations(vec![row(1, 1, (0, 1))]);
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_seat_columns() {
        let (rows, numbers) = seat_columns(&[Seat::new(1, 2), Seat::new(3, 4)]);
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(numbers, vec![2, 4]);
    }
}

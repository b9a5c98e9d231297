//! `PostgreSQL` ledger tests.
//!
//! Ignored by default. Point `PLANETARIUM_TEST_DATABASE_URL` at a scratch
//! database and run with `--ignored`. Every test creates its own dome and
//! session, so runs never collide on the ticket uniqueness index.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use planetarium_api::booking::{BookingOptions, ErrorKind, LedgerError, ReservationService};
use planetarium_api::db::{self, CatalogRepository, LedgerRepository, RepositoryError};
use planetarium_core::{NewReservation, Seat, ShowSessionId, UserId};
use planetarium_integration_tests::seats;

async fn pool() -> PgPool {
    let url = std::env::var("PLANETARIUM_TEST_DATABASE_URL")
        .expect("PLANETARIUM_TEST_DATABASE_URL must be set for ignored tests");
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn session(catalog: &CatalogRepository, rows: u16, seats_in_row: u16) -> ShowSessionId {
    let dome = catalog
        .insert_dome("Ledger Test Dome", None, rows, seats_in_row)
        .await
        .unwrap();
    let show = catalog
        .insert_show("Ledger Test Show", "Postgres fixture", 40)
        .await
        .unwrap();
    catalog
        .insert_session(show.id, dome.id, Utc::now() + TimeDelta::days(1))
        .await
        .unwrap()
        .id
}

fn draft(user: i32, session: ShowSessionId, pairs: &[(u16, u16)]) -> NewReservation {
    NewReservation::new(UserId::new(user), session, seats(pairs)).unwrap()
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_append_assigns_ids_and_keeps_order() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());
    let ledger = LedgerRepository::new(pool);
    let session = session(&catalog, 2, 3).await;

    let reservation = ledger
        .append(draft(1, session, &[(2, 3), (1, 1)]))
        .await
        .unwrap();

    assert_eq!(reservation.user, UserId::new(1));
    assert_eq!(
        reservation.seats().collect::<Vec<_>>(),
        seats(&[(2, 3), (1, 1)])
    );
    assert!(reservation.tickets.iter().all(|t| t.reservation == reservation.id));

    let stored = ledger.get_reservation(reservation.id).await.unwrap();
    assert_eq!(stored, Some(reservation));
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_conflicting_append_writes_nothing() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());
    let ledger = LedgerRepository::new(pool);
    let session = session(&catalog, 2, 3).await;

    ledger.append(draft(1, session, &[(1, 2)])).await.unwrap();

    let err = ledger
        .append(draft(2, session, &[(1, 1), (1, 2)]))
        .await
        .unwrap_err();
    match err {
        LedgerError::Conflict { seats: taken, .. } => assert_eq!(taken, vec![Seat::new(1, 2)]),
        other => panic!("expected conflict, got {other:?}"),
    }

    let all = ledger.list_for_session(session).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(ledger.list_for_user(UserId::new(2)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_concurrent_appends_never_double_book() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());
    let ledger = LedgerRepository::new(pool);
    let session = session(&catalog, 1, 4).await;

    let mut handles = Vec::new();
    for user in 1..=16 {
        let ledger = ledger.clone();
        let seat = u16::try_from(user % 4 + 1).unwrap();
        handles.push(tokio::spawn(async move {
            ledger.append(draft(user, session, &[(1, seat)])).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(LedgerError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected ledger error: {other}"),
        }
    }
    assert_eq!(winners, 4);

    let taken: Vec<Seat> = ledger
        .list_for_session(session)
        .await
        .unwrap()
        .iter()
        .map(|t| t.seat)
        .collect();
    let unique: BTreeSet<Seat> = taken.iter().copied().collect();
    assert_eq!(unique.len(), taken.len());
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_list_for_user_is_newest_first() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());
    let ledger = LedgerRepository::new(pool);
    let session = session(&catalog, 3, 3).await;
    let user = 900_000 + session.as_i32();

    let mut ids = Vec::new();
    for seat in 1..=3 {
        let reservation = ledger
            .append(draft(user, session, &[(2, seat)]))
            .await
            .unwrap();
        ids.push(reservation.id);
    }

    let listed: Vec<_> = ledger
        .list_for_user(UserId::new(user))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_service_over_postgres() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());
    let session = session(&catalog, 2, 2).await;
    let service = ReservationService::new(
        catalog,
        LedgerRepository::new(pool),
        BookingOptions::default(),
    );

    service
        .create_reservation(UserId::new(1), session, seats(&[(1, 1), (1, 2)]))
        .await
        .unwrap();
    let err = service
        .create_reservation(UserId::new(2), session, seats(&[(1, 2)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SeatConflict);

    let err = service
        .create_reservation(UserId::new(2), session, seats(&[(3, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSeat);

    assert_eq!(
        service.free_seats(session).await.unwrap(),
        seats(&[(2, 1), (2, 2)]).into_iter().collect()
    );
}

#[tokio::test]
#[ignore = "requires PLANETARIUM_TEST_DATABASE_URL"]
async fn test_oversized_dome_is_rejected() {
    let pool = pool().await;
    let catalog = CatalogRepository::new(pool.clone());

    let err = catalog
        .insert_dome("Stadium", None, 5000, 5000)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidValue(_)));

    // The column check holds even for writers that skip the repository.
    let raw = sqlx::query(
        "INSERT INTO planetarium.planetarium_dome (name, rows_count, seats_in_row) \
         VALUES ('Stadium', 5000, 5000)",
    )
    .execute(&pool)
    .await;
    assert!(raw.is_err());
}

//! Demo catalog used by `planetarium seed` and by memory storage.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tracing::info;

use planetarium_core::{AstronomyShow, Dome, ShowSession};

use crate::booking::MemoryStore;
use crate::db::{CatalogRepository, RepositoryError};

/// What was inserted.
#[derive(Debug, Clone, Default)]
pub struct SeedSummary {
    /// Inserted domes.
    pub domes: Vec<Dome>,
    /// Inserted shows.
    pub shows: Vec<AstronomyShow>,
    /// Inserted sessions.
    pub sessions: Vec<ShowSession>,
}

struct DemoDome {
    name: &'static str,
    description: &'static str,
    rows: u16,
    seats_in_row: u16,
}

struct DemoShow {
    title: &'static str,
    description: &'static str,
    duration_minutes: u32,
}

const DOMES: [DemoDome; 2] = [
    DemoDome {
        name: "Small Dome",
        description: "Intimate dome for school groups",
        rows: 2,
        seats_in_row: 3,
    },
    DemoDome {
        name: "Main Hall",
        description: "Full-dome projection, 8K",
        rows: 10,
        seats_in_row: 12,
    },
];

const SHOWS: [DemoShow; 2] = [
    DemoShow {
        title: "Journey to the Edge of the Universe",
        description: "A flight past galaxies, quasars and the cosmic horizon",
        duration_minutes: 60,
    },
    DemoShow {
        title: "Aurora: Lights of the North",
        description: "How the solar wind paints the polar sky",
        duration_minutes: 45,
    },
];

/// Session start times: tomorrow at 18:00 and 20:00 UTC, and the day after at 18:00.
fn session_times(now: DateTime<Utc>) -> [DateTime<Utc>; 3] {
    let midnight = now.duration_trunc(TimeDelta::days(1)).unwrap_or(now);
    let tomorrow = midnight + TimeDelta::days(1);
    [
        tomorrow + TimeDelta::hours(18),
        tomorrow + TimeDelta::hours(20),
        tomorrow + TimeDelta::days(1) + TimeDelta::hours(18),
    ]
}

/// Fill a memory store with the demo catalog.
pub fn seed_memory(store: &MemoryStore) -> SeedSummary {
    let mut summary = SeedSummary::default();

    for d in &DOMES {
        summary
            .domes
            .push(store.insert_dome(d.name, Some(d.description), d.rows, d.seats_in_row));
    }
    for s in &SHOWS {
        summary
            .shows
            .push(store.insert_show(s.title, s.description, s.duration_minutes));
    }
    for (i, begin) in session_times(Utc::now()).into_iter().enumerate() {
        let dome = &summary.domes[i % summary.domes.len()];
        let show = &summary.shows[i % summary.shows.len()];
        summary
            .sessions
            .push(store.insert_session(show.id, dome.id, begin));
    }

    info!(
        domes = summary.domes.len(),
        shows = summary.shows.len(),
        sessions = summary.sessions.len(),
        "Seeded memory storage"
    );
    summary
}

/// Insert the demo catalog into `PostgreSQL`.
///
/// # Errors
///
/// Returns `RepositoryError` if an insert fails.
pub async fn seed_postgres(catalog: &CatalogRepository) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    for d in &DOMES {
        summary.domes.push(
            catalog
                .insert_dome(d.name, Some(d.description), d.rows, d.seats_in_row)
                .await?,
        );
    }
    for s in &SHOWS {
        summary.shows.push(
            catalog
                .insert_show(s.title, s.description, s.duration_minutes)
                .await?,
        );
    }
    for (i, begin) in session_times(Utc::now()).into_iter().enumerate() {
        let dome = summary.domes[i % summary.domes.len()].id;
        let show = summary.shows[i % summary.shows.len()].id;
        summary
            .sessions
            .push(catalog.insert_session(show, dome, begin).await?);
    }

    info!(
        domes = summary.domes.len(),
        shows = summary.shows.len(),
        sessions = summary.sessions.len(),
        "Seeded database"
    );
    Ok(summary)
}

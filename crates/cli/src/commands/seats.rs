//! Print a session's seat map.
//!
//! ```text
//! Small Dome, session 1 (2026-03-02 18:00 UTC)
//!
//!        1  2  3
//! row  1 X  X  .
//! row  2 .  .  .
//!
//! 2 of 6 seats taken, 4 available
//! ```

use std::fmt::Write as _;

use planetarium_api::booking::{BookingOptions, ReservationService, SeatMap};
use planetarium_api::storage::Storage;
use planetarium_core::{Seat, ShowSessionId};

/// Print the seat map of `session`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the query fails or the
/// session does not exist.
pub async fn run(session: ShowSessionId) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let storage = Storage::postgres(pool);
    let service = ReservationService::new(storage.clone(), storage, BookingOptions::default());

    let map = service.seat_map(session).await?;

    #[allow(clippy::print_stdout)]
    {
        print!("{}", render(&map));
    }
    Ok(())
}

/// Render a seat map as text. `X` is taken, `.` is free.
fn render(map: &SeatMap) -> String {
    let dome = &map.dome;
    let width = dome.seats_in_row.to_string().len().max(2);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}, session {} ({})\n",
        dome.name,
        map.session.id,
        map.session.show_begin.format("%Y-%m-%d %H:%M UTC")
    );

    out.push_str("       ");
    for number in 1..=dome.seats_in_row {
        let _ = write!(out, "{number:<width$} ");
    }
    out.push('\n');

    for row in 1..=dome.rows {
        let _ = write!(out, "row {row:>2} ");
        for number in 1..=dome.seats_in_row {
            let mark = if map.taken.contains(&Seat::new(row, number)) {
                'X'
            } else {
                '.'
            };
            let _ = write!(out, "{mark:<width$} ");
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\n{} of {} seats taken, {} available",
        map.taken.len(),
        dome.capacity(),
        map.tickets_available()
    );
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use planetarium_core::{AstronomyShowId, Dome, DomeId, ShowSession};

    use super::*;

    #[test]
    fn test_render_marks_taken_seats() {
        let dome = Arc::new(Dome {
            id: DomeId::new(1),
            name: "Small Dome".to_string(),
            description: None,
            rows: 2,
            seats_in_row: 3,
        });
        let taken = [Seat::new(1, 1), Seat::new(1, 2)].into_iter().collect();
        let free = dome.seats().filter(|s| s.row == 2 || s.number == 3).collect();
        let map = SeatMap {
            session: ShowSession {
                id: ShowSessionId::new(1),
                astronomy_show: AstronomyShowId::new(1),
                dome: dome.id,
                show_begin: chrono::Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap(),
            },
            dome,
            taken,
            free,
        };

        let text = render(&map);
        assert!(text.starts_with("Small Dome, session 1 (2026-03-02 18:00 UTC)"));
        assert!(text.contains("row  1 X  X  .  \n"));
        assert!(text.contains("row  2 .  .  .  \n"));
        assert!(text.contains("2 of 6 seats taken, 4 available"));
    }
}

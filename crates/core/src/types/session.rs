//! Astronomy shows and their scheduled sessions.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AstronomyShowId, DomeId, ShowSessionId};

/// An astronomy show that can be screened in a dome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstronomyShow {
    /// Unique show ID.
    pub id: AstronomyShowId,
    /// Show title.
    pub title: String,
    /// Show description.
    pub description: String,
    /// Running time in minutes.
    pub duration_minutes: u32,
}

impl AstronomyShow {
    /// Running time of the show.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration_minutes))
    }
}

/// A scheduled screening of a show in a dome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSession {
    /// Unique session ID.
    pub id: ShowSessionId,
    /// The show being screened.
    pub astronomy_show: AstronomyShowId,
    /// The dome hosting the screening.
    pub dome: DomeId,
    /// Scheduled start time.
    pub show_begin: DateTime<Utc>,
}

impl ShowSession {
    /// Scheduled end time, given the show screened in this session.
    #[must_use]
    pub fn show_end(&self, show: &AstronomyShow) -> DateTime<Utc> {
        self.show_begin + show.duration()
    }
}

/// Criteria for listing sessions. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFilter {
    /// Only sessions screening this show.
    pub astronomy_show: Option<AstronomyShowId>,
    /// Only sessions hosted in this dome.
    pub planetarium_dome: Option<DomeId>,
    /// Only sessions starting on this calendar day (UTC).
    pub date: Option<NaiveDate>,
}

impl SessionFilter {
    /// Whether `session` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, session: &ShowSession) -> bool {
        self.astronomy_show.is_none_or(|id| id == session.astronomy_show)
            && self.planetarium_dome.is_none_or(|id| id == session.dome)
            && self.date.is_none_or(|day| day == session.show_begin.date_naive())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_show_end_adds_duration() {
        let show = AstronomyShow {
            id: AstronomyShowId::new(1),
            title: "Journey to the Edge of the Universe".to_string(),
            description: "A tour past the observable horizon".to_string(),
            duration_minutes: 90,
        };
        let session = ShowSession {
            id: ShowSessionId::new(1),
            astronomy_show: show.id,
            dome: DomeId::new(1),
            show_begin: Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap(),
        };

        assert_eq!(
            session.show_end(&show),
            Utc.with_ymd_and_hms(2026, 3, 1, 20, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_session_filter() {
        let session = ShowSession {
            id: ShowSessionId::new(1),
            astronomy_show: AstronomyShowId::new(2),
            dome: DomeId::new(3),
            show_begin: Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap(),
        };

        assert!(SessionFilter::default().matches(&session));
        assert!(
            SessionFilter {
                astronomy_show: Some(AstronomyShowId::new(2)),
                planetarium_dome: Some(DomeId::new(3)),
                date: NaiveDate::from_ymd_opt(2026, 3, 1),
            }
            .matches(&session)
        );
        assert!(
            !SessionFilter {
                planetarium_dome: Some(DomeId::new(4)),
                ..SessionFilter::default()
            }
            .matches(&session)
        );
        assert!(
            !SessionFilter {
                date: NaiveDate::from_ymd_opt(2026, 3, 2),
                ..SessionFilter::default()
            }
            .matches(&session)
        );
    }
}

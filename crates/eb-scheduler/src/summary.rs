//! A machine-readable overview of a registry's sessions.

use chrono::{NaiveDate, NaiveTime};
use eb_core::{Entity, EntityKind, Registry, Session, Student};
use serde::Serialize;

/// Per-session occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// The session identity.
    pub id: String,
    /// The venue id.
    pub venue: String,
    /// The day the session is held.
    pub day: NaiveDate,
    /// The start time.
    pub start: NaiveTime,
    /// Identities of the scheduled exams.
    pub exams: Vec<String>,
    /// Students enrolled.
    pub students: usize,
    /// Desks with an occupant.
    pub seated: usize,
    /// Desks still free.
    pub remaining: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.identity(),
            venue: session.venue_id().to_owned(),
            day: session.day(),
            start: session.start(),
            exams: session.exams().to_vec(),
            students: session.student_count(),
            seated: session.occupied_desks(),
            remaining: session.remaining_desks(),
        }
    }
}

/// Entity counts and session occupancy for one exam block.
///
/// # Examples
///
/// ```
/// use eb_core::{Registry, Room};
/// use eb_scheduler::BlockSummary;
///
/// let mut registry = Registry::new();
/// registry.add(Room::new("R1")).unwrap();
///
/// let summary = BlockSummary::from_registry(&registry);
/// assert_eq!(summary.rooms, 1);
/// assert!(summary.sessions.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// Registered subjects.
    pub subjects: usize,
    /// Registered units.
    pub units: usize,
    /// Registered students.
    pub students: usize,
    /// Students with the AARA flag.
    pub aara_students: usize,
    /// Registered exams.
    pub exams: usize,
    /// Plain rooms.
    pub rooms: usize,
    /// Venues.
    pub venues: usize,
    /// Every session in registration order.
    pub sessions: Vec<SessionSummary>,
}

impl BlockSummary {
    /// Builds the summary.
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            subjects: registry.count(EntityKind::Subject),
            units: registry.count(EntityKind::Unit),
            students: registry.count(EntityKind::Student),
            aara_students: registry
                .all::<Student>()
                .iter()
                .filter(|student| student.is_aara())
                .count(),
            exams: registry.count(EntityKind::Exam),
            rooms: registry.count(EntityKind::Room),
            venues: registry.count(EntityKind::Venue),
            sessions: registry
                .all::<Session>()
                .iter()
                .map(SessionSummary::from)
                .collect(),
        }
    }

    /// Renders the summary as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use eb_core::Venue;

    use super::*;

    #[test]
    fn test_session_summary_json() {
        let mut registry = Registry::new();
        let venue = Venue::new("V1", 1, vec!["R1".to_owned()], 2, 3, 5, true);
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let start = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        let mut session = Session::new(&venue, 2, day, start);
        session.schedule_exam("art_20250310", 3);
        registry.add(venue).unwrap();
        registry.add(session).unwrap();

        let summary = BlockSummary::from_registry(&registry);
        assert_eq!(summary.venues, 1);
        assert_eq!(summary.rooms, 0);

        insta::assert_snapshot!(summary.to_json().unwrap(), @r#"
        {
          "subjects": 0,
          "units": 0,
          "students": 0,
          "aara_students": 0,
          "exams": 0,
          "rooms": 0,
          "venues": 1,
          "sessions": [
            {
              "id": "V1#2",
              "venue": "V1",
              "day": "2025-03-10",
              "start": "08:30:00",
              "exams": [
                "art_20250310"
              ],
              "students": 3,
              "seated": 0,
              "remaining": 2
            }
          ]
        }
        "#);
    }
}

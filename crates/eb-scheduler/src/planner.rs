//! Session lookup, scheduling and allocation over a registry.

use std::io::Write;

use chrono::{NaiveDate, NaiveTime};
use eb_core::{AllocationConfig, Entity, Exam, Registry, Session, Student, Venue};
use tracing::{debug, info};

use crate::allocation::{Allocation, allocate};
use crate::error::ScheduleError;

/// Plans sessions for a registry.
///
/// Every mutating operation checks first and mutates second: a rejected
/// call leaves the registry exactly as it found it.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use eb_core::{Exam, ExamKind, Registry, Subject, Venue};
/// use eb_scheduler::SessionPlanner;
///
/// let mut registry = Registry::new();
/// let art = Subject::new("Art", "Paint.");
/// let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let exam = registry.add(Exam::new(&art, ExamKind::Internal, day, nine)).unwrap();
/// registry.add(art).unwrap();
/// registry.add(Venue::new("V1", 1, vec!["R1".into()], 2, 2, 4, false)).unwrap();
///
/// let mut planner = SessionPlanner::new(&mut registry);
/// let session = planner.create_session_for_exam("V1", &exam).unwrap();
/// assert_eq!(session, "V1#1");
/// assert_eq!(planner.session_number("V1", day, nine), Some(1));
/// ```
#[derive(Debug)]
pub struct SessionPlanner<'a> {
    registry: &'a mut Registry,
    config: AllocationConfig,
}

impl<'a> SessionPlanner<'a> {
    /// Creates a planner with the default allocation settings.
    pub fn new(registry: &'a mut Registry) -> Self {
        Self::with_config(registry, AllocationConfig::default())
    }

    /// Creates a planner with explicit allocation settings.
    pub fn with_config(registry: &'a mut Registry, config: AllocationConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    /// Returns the number of the venue's session at a day and start time.
    #[must_use]
    pub fn session_number(&self, venue_id: &str, day: NaiveDate, start: NaiveTime) -> Option<u32> {
        self.session_at(venue_id, day, start)
            .map(Session::session_number)
    }

    /// Returns a venue's session by number.
    pub fn session(&self, venue_id: &str, number: u32) -> Result<&Session, ScheduleError> {
        self.sessions_for_venue(venue_id)
            .into_iter()
            .find(|session| session.session_number() == number)
            .ok_or_else(|| ScheduleError::NoSession {
                venue: venue_id.to_owned(),
                detail: format!("numbered {number}"),
            })
    }

    /// Returns the venue's session that holds an exam.
    pub fn session_for_exam(&self, venue_id: &str, exam_id: &str) -> Result<&Session, ScheduleError> {
        self.sessions_for_venue(venue_id)
            .into_iter()
            .find(|session| session.has_exam(exam_id))
            .ok_or_else(|| ScheduleError::NoSession {
                venue: venue_id.to_owned(),
                detail: format!("holds exam {exam_id}"),
            })
    }

    /// Returns the venue's sessions in registration order.
    #[must_use]
    pub fn sessions_for_venue(&self, venue_id: &str) -> Vec<&Session> {
        self.registry
            .all::<Session>()
            .iter()
            .filter(|session| session.venue_id() == venue_id)
            .collect()
    }

    /// Returns the number the venue's next session would take.
    pub fn next_session_number(&self, venue_id: &str) -> Result<u32, ScheduleError> {
        match self
            .sessions_for_venue(venue_id)
            .iter()
            .map(|session| session.session_number())
            .max()
        {
            None => Ok(1),
            Some(highest) => highest
                .checked_add(1)
                .ok_or_else(|| ScheduleError::SessionNumbersExhausted {
                    venue: venue_id.to_owned(),
                }),
        }
    }

    /// Counts the students who would sit an exam at a venue.
    pub fn eligible_students(&self, venue_id: &str, exam_id: &str) -> Result<usize, ScheduleError> {
        let venue = self.registry.get::<Venue>(venue_id)?;
        let exam = self.registry.get::<Exam>(exam_id)?;
        Ok(self.registry.count_students(exam.subject_id(), venue.is_aara()))
    }

    /// Returns the students already in the session at the exam's day and
    /// start time, or zero if there is none.
    pub fn existing_session_total(&self, venue_id: &str, exam_id: &str) -> Result<usize, ScheduleError> {
        let exam = self.registry.get::<Exam>(exam_id)?;
        Ok(self
            .session_at(venue_id, exam.date(), exam.time())
            .map_or(0, Session::student_count))
    }

    /// Returns the session total after adding `students`, creating the
    /// session for the exam's day and start time if the venue has none.
    pub fn session_new_total(
        &mut self,
        venue_id: &str,
        exam_id: &str,
        students: usize,
    ) -> Result<usize, ScheduleError> {
        let exam = self.registry.get::<Exam>(exam_id)?;
        let (day, start) = (exam.date(), exam.time());

        if let Some(session) = self.session_at(venue_id, day, start) {
            return Ok(session.student_count() + students);
        }

        let number = self.next_session_number(venue_id)?;
        let venue = self.registry.get::<Venue>(venue_id)?;
        let session = Session::new(venue, number, day, start);
        let id = self.registry.add(session)?;
        info!(session = %id, %day, %start, "Created session");
        Ok(students)
    }

    /// Adds an exam to the venue's session at the exam's day and start
    /// time, enrolling every eligible student.
    ///
    /// Returns the session identity.
    pub fn schedule_exam(&mut self, venue_id: &str, exam_id: &str) -> Result<String, ScheduleError> {
        let exam = self.registry.get::<Exam>(exam_id)?;
        let session = self
            .session_at(venue_id, exam.date(), exam.time())
            .ok_or_else(|| ScheduleError::NoSession {
                venue: venue_id.to_owned(),
                detail: format!("at {} {}", exam.date(), exam.time().format("%H:%M")),
            })?;
        let session_id = session.identity();
        self.check_can_add(&session_id, exam_id)?;
        self.enrol(&session_id, exam_id)?;
        Ok(session_id)
    }

    /// Creates a new session at the exam's day and start time, schedules
    /// the exam into it and allocates desks.
    ///
    /// Rejected if the venue already has a session at that time, already
    /// holds the exam in another session, or the exam's students would
    /// not fit.
    pub fn create_session_for_exam(&mut self, venue_id: &str, exam_id: &str) -> Result<String, ScheduleError> {
        let exam = self.registry.get::<Exam>(exam_id)?;
        let existing = self
            .session_at(venue_id, exam.date(), exam.time())
            .or_else(|| self.session_for_exam(venue_id, exam_id).ok());
        if let Some(existing) = existing {
            return Err(ScheduleError::AlreadyScheduled {
                session: existing.identity(),
                exam: exam_id.to_owned(),
            });
        }
        self.next_session_number(venue_id)?;

        let students = self.eligible_students(venue_id, exam_id)?;
        let venue = self.registry.get::<Venue>(venue_id)?;
        if !venue.will_fit(students) {
            return Err(ScheduleError::CapacityExceeded {
                venue: venue_id.to_owned(),
                students,
                desks: venue.desk_count(),
            });
        }

        self.session_new_total(venue_id, exam_id, students)?;
        let session_id = self.schedule_exam(venue_id, exam_id)?;
        self.allocate_session(&session_id)?;
        Ok(session_id)
    }

    /// Adds an exam to an existing session and reallocates its desks.
    pub fn add_exam_to_session(&mut self, session_id: &str, exam_id: &str) -> Result<Allocation, ScheduleError> {
        self.check_can_add(session_id, exam_id)?;
        self.enrol(session_id, exam_id)?;
        self.allocate_session(session_id)
    }

    /// Allocates desks for one session.
    pub fn allocate_session(&mut self, session_id: &str) -> Result<Allocation, ScheduleError> {
        let context = self.registry.session_context(session_id)?;
        Ok(allocate(context, &self.config))
    }

    /// Allocates every session, venue by venue.
    pub fn allocate_all(&mut self) -> Result<Vec<(String, Allocation)>, ScheduleError> {
        let ids: Vec<String> = self
            .registry
            .all::<Venue>()
            .iter()
            .flat_map(|venue| self.sessions_for_venue(venue.id()))
            .map(Entity::identity)
            .collect();

        let mut allocations = Vec::with_capacity(ids.len());
        for id in ids {
            let allocation = self.allocate_session(&id)?;
            allocations.push((id, allocation));
        }
        Ok(allocations)
    }

    /// Writes the desk map of every session, venue by venue.
    pub fn write_allocations<W: Write>(&self, mut out: W, column_width: usize) -> Result<(), ScheduleError> {
        for venue in self.registry.all::<Venue>() {
            for session in self.sessions_for_venue(venue.id()) {
                writeln!(out, "{venue}")?;
                writeln!(
                    out,
                    "Session {}: {} {}",
                    session.session_number(),
                    session.day(),
                    session.start().format("%H:%M")
                )?;
                for exam_id in session.exams() {
                    let exam = self.registry.get::<Exam>(exam_id)?;
                    write!(out, "{}", exam.title())?;
                }
                writeln!(out)?;
                write!(out, "{}", session.print_desks(column_width))?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn session_at(&self, venue_id: &str, day: NaiveDate, start: NaiveTime) -> Option<&Session> {
        self.registry
            .all::<Session>()
            .iter()
            .find(|session| session.venue_id() == venue_id && session.is_at(day, start))
    }

    fn check_can_add(&self, session_id: &str, exam_id: &str) -> Result<(), ScheduleError> {
        let session = self.registry.get::<Session>(session_id)?;
        let exam = self.registry.get::<Exam>(exam_id)?;

        if !session.is_at(exam.date(), exam.time()) {
            return Err(ScheduleError::TimeMismatch {
                session: session_id.to_owned(),
                exam: exam_id.to_owned(),
            });
        }
        if let Ok(existing) = self.session_for_exam(session.venue_id(), exam_id) {
            return Err(ScheduleError::AlreadyScheduled {
                session: existing.identity(),
                exam: exam_id.to_owned(),
            });
        }

        let venue = self.registry.get::<Venue>(session.venue_id())?;
        let students = session.student_count()
            + self.registry.count_students(exam.subject_id(), venue.is_aara());
        if !venue.will_fit(students) {
            return Err(ScheduleError::CapacityExceeded {
                venue: venue.id().to_owned(),
                students,
                desks: venue.desk_count(),
            });
        }
        Ok(())
    }

    fn enrol(&mut self, session_id: &str, exam_id: &str) -> Result<(), ScheduleError> {
        let session = self.registry.get::<Session>(session_id)?;
        let venue = self.registry.get::<Venue>(session.venue_id())?;
        let exam = self.registry.get::<Exam>(exam_id)?;

        let luis: Vec<String> = self
            .registry
            .all::<Student>()
            .iter()
            .filter(|student| student.is_eligible(exam, venue.is_aara()))
            .map(Entity::identity)
            .collect();

        self.registry
            .get_mut::<Session>(session_id)?
            .schedule_exam(exam_id, luis.len());
        for lui in &luis {
            self.registry.get_mut::<Student>(lui)?.add_exam(exam_id);
        }

        debug!(session = %session_id, exam = %exam_id, students = luis.len(), "Enrolled exam");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use eb_core::{ExamKind, Subject};

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn fixture() -> Registry {
        let mut registry = Registry::new();
        let art = Subject::new("Art", "Paint.");
        let music = Subject::new("Music", "Sound.");

        for (lui, family, subject, aara) in [
            (1, "Adams", &art, false),
            (2, "Brown", &art, false),
            (3, "Clark", &music, false),
            (4, "Davis", &art, true),
        ] {
            let dob = NaiveDate::from_ymd_opt(2007, 1, 1).unwrap();
            let mut student = Student::new(lui, "Jo", family, dob, "Red", aara);
            student.add_subject(&subject.identity());
            registry.add(student).unwrap();
        }

        registry
            .add(Exam::new(&art, ExamKind::External, day(10), at(9)))
            .unwrap();
        registry
            .add(Exam::new(&music, ExamKind::External, day(10), at(9)))
            .unwrap();
        registry
            .add(Exam::new(&music, ExamKind::Internal, day(11), at(13)))
            .unwrap();
        registry.add(art).unwrap();
        registry.add(music).unwrap();
        registry
            .add(Venue::new("V1", 1, vec!["R1".to_owned()], 2, 2, 4, false))
            .unwrap();
        registry
            .add(Venue::new("TINY", 1, vec!["R2".to_owned()], 1, 1, 1, false))
            .unwrap();
        registry
    }

    #[test]
    fn test_session_new_total_creates_once() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);

        assert_eq!(planner.existing_session_total("V1", "art_20250310").unwrap(), 0);
        assert_eq!(planner.session_new_total("V1", "art_20250310", 2).unwrap(), 2);
        assert_eq!(planner.session_number("V1", day(10), at(9)), Some(1));

        planner.schedule_exam("V1", "art_20250310").unwrap();
        assert_eq!(planner.existing_session_total("V1", "music_20250310").unwrap(), 2);
        assert_eq!(planner.session_new_total("V1", "music_20250310", 1).unwrap(), 3);
        assert_eq!(planner.sessions_for_venue("V1").len(), 1);
    }

    #[test]
    fn test_session_numbers_are_per_venue() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);

        planner.create_session_for_exam("V1", "art_20250310").unwrap();
        let second = planner.create_session_for_exam("V1", "music_20250311").unwrap();
        assert_eq!(second, "V1#2");
        assert_eq!(planner.next_session_number("TINY").unwrap(), 1);
        assert_eq!(planner.session("V1", 2).unwrap().day(), day(11));
        assert!(planner.session("V1", 3).unwrap_err().is_rejection());
    }

    #[test]
    fn test_schedule_enrols_eligible_students() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);

        planner.create_session_for_exam("V1", "art_20250310").unwrap();
        let session = planner.session_for_exam("V1", "art_20250310").unwrap();
        assert_eq!(session.student_count(), 2);
        assert_eq!(session.occupied_desks(), 2);

        let davis = registry.get::<Student>("0000000004").unwrap();
        assert!(davis.exams().is_empty());
        let adams = registry.get::<Student>("0000000001").unwrap();
        assert_eq!(adams.exams(), ["art_20250310"]);
    }

    #[test]
    fn test_rejections_leave_registry_unchanged() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);
        planner.create_session_for_exam("V1", "art_20250310").unwrap();
        let before = planner.registry().clone();

        let err = planner.create_session_for_exam("TINY", "art_20250310").unwrap_err();
        assert!(matches!(err, ScheduleError::CapacityExceeded { students: 2, desks: 1, .. }));

        let err = planner.add_exam_to_session("V1#1", "art_20250310").unwrap_err();
        assert!(matches!(err, ScheduleError::AlreadyScheduled { .. }));

        let err = planner.add_exam_to_session("V1#1", "music_20250311").unwrap_err();
        assert!(matches!(err, ScheduleError::TimeMismatch { .. }));

        let err = planner.schedule_exam("V1", "music_20250311").unwrap_err();
        assert!(matches!(err, ScheduleError::NoSession { .. }));

        assert_eq!(
            planner.registry().all::<Session>(),
            before.all::<Session>()
        );
        assert_eq!(
            planner.registry().all::<Student>(),
            before.all::<Student>()
        );
    }

    #[test]
    fn test_exhausted_session_numbers_are_rejected() {
        let mut registry = fixture();
        let venue = registry.get::<Venue>("V1").unwrap().clone();
        registry
            .add(Session::new(&venue, u32::MAX, day(11), at(13)))
            .unwrap();
        let mut planner = SessionPlanner::new(&mut registry);

        let err = planner.next_session_number("V1").unwrap_err();
        assert!(matches!(err, ScheduleError::SessionNumbersExhausted { .. }));

        let err = planner.create_session_for_exam("V1", "art_20250310").unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(planner.registry().len::<Session>(), 1);
        assert_eq!(planner.next_session_number("TINY").unwrap(), 1);
    }

    #[test]
    fn test_exam_held_at_another_time_is_not_rescheduled() {
        let mut registry = fixture();
        let venue = registry.get::<Venue>("V1").unwrap().clone();
        let mut afternoon = Session::new(&venue, 1, day(10), at(13));
        afternoon.schedule_exam("art_20250310", 2);
        registry.add(afternoon).unwrap();
        let before = registry.clone();
        let mut planner = SessionPlanner::new(&mut registry);

        let err = planner.create_session_for_exam("V1", "art_20250310").unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::AlreadyScheduled { ref session, .. } if session == "V1#1"
        ));
        assert_eq!(planner.registry().all::<Session>(), before.all::<Session>());
        assert_eq!(planner.registry().all::<Student>(), before.all::<Student>());
    }

    #[test]
    fn test_add_exam_reallocates() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);
        let id = planner.create_session_for_exam("V1", "art_20250310").unwrap();

        let allocation = planner.add_exam_to_session(&id, "music_20250310").unwrap();
        assert_eq!(allocation.report().unwrap().seated, 3);

        let session = planner.registry().get::<Session>(&id).unwrap();
        assert_eq!(session.exams(), ["art_20250310", "music_20250310"]);
        assert_eq!(session.student_count(), 3);
    }

    #[test]
    fn test_write_allocations() {
        let mut registry = fixture();
        let mut planner = SessionPlanner::new(&mut registry);
        planner.create_session_for_exam("V1", "art_20250310").unwrap();

        let mut out = Vec::new();
        planner.write_allocations(&mut out, 10).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("V1 (4 desks)\nSession 1: 2025-03-10 09:00\n"));
        assert!(text.contains("Desk 1    Desk 3    \nAdams     "));
    }
}

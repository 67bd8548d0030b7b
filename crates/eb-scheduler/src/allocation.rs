//! Deterministic desk allocation for one session.
//!
//! Students are seated exam by exam, column-major through the grid: desk
//! `n` sits at `row = (n - 1) % rows`, `column = (n - 1) / rows`. When
//! fewer than half the desks are needed the layout is *sparse* and every
//! completed column is followed by an empty one. Exams are separated by an
//! even share of the spare desks.

use std::fmt;

use eb_core::{AllocationConfig, Entity, Occupant, SessionContext, Student};
use serde::Serialize;
use tracing::{debug, info, warn};

/// How the grid is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatingMode {
    /// Fewer than half the desks are needed; alternate columns stay empty.
    Sparse,
    /// Desks are filled without column skips.
    Dense,
}

impl SeatingMode {
    /// Chooses the mode and the number of spare desks.
    ///
    /// # Examples
    ///
    /// ```
    /// use eb_scheduler::SeatingMode;
    ///
    /// assert_eq!(SeatingMode::choose(4, 10), (SeatingMode::Sparse, 1));
    /// assert_eq!(SeatingMode::choose(5, 10), (SeatingMode::Dense, 5));
    /// assert_eq!(SeatingMode::choose(10, 10), (SeatingMode::Dense, 0));
    /// ```
    #[must_use]
    pub const fn choose(students: usize, desks: usize) -> (Self, usize) {
        let half = desks / 2;
        if students < half {
            (Self::Sparse, half - students)
        } else {
            (Self::Dense, desks.saturating_sub(students))
        }
    }
}

impl fmt::Display for SeatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sparse => f.write_str("sparse"),
            Self::Dense => f.write_str("dense"),
        }
    }
}

/// What a completed allocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationReport {
    /// Students given a desk.
    pub seated: usize,
    /// Eligible students the layout ran past the end of the grid for.
    pub unseated: usize,
    /// The fill mode used.
    pub mode: SeatingMode,
    /// Desks left empty between consecutive exams.
    pub inter_gap: usize,
}

/// The outcome of [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Allocation {
    /// Desks were assigned.
    Seated(AllocationReport),
    /// More students are enrolled than the venue has desks. Nothing was
    /// changed.
    Overflow {
        /// Students enrolled in the session.
        students: usize,
        /// Desks available.
        desks: usize,
    },
}

impl Allocation {
    /// Returns the report of a successful allocation.
    #[must_use]
    pub const fn report(&self) -> Option<&AllocationReport> {
        match self {
            Self::Seated(report) => Some(report),
            Self::Overflow { .. } => None,
        }
    }

    /// Returns `true` if the session was over capacity.
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}

/// Seats the students of every exam in a session.
///
/// Identical inputs always produce identical layouts. An over-capacity
/// session is reported as [`Allocation::Overflow`] and left untouched.
pub fn allocate(context: SessionContext<'_>, config: &AllocationConfig) -> Allocation {
    let SessionContext {
        session,
        venue,
        exams,
        students,
    } = context;

    let total = session.student_count();
    let desks = venue.desk_count();
    if total > desks {
        warn!(
            session = %session.identity(),
            students = total,
            desks,
            "Session is over capacity, no desks allocated"
        );
        return Allocation::Overflow {
            students: total,
            desks,
        };
    }

    let (mode, gaps) = SeatingMode::choose(total, desks);
    let inter_gap = match session.exams().len() {
        0 | 1 => 0,
        n => gaps / (n - 1),
    };

    let mut sorted: Vec<&Student> = students.iter().collect();
    sorted.sort_by(|a, b| a.family_name().cmp(b.family_name()));

    if config.reset_desks {
        session.clear_desks();
    }

    let rows = session.rows();
    let exam_ids: Vec<String> = session.exams().to_vec();
    let mut next = 1;
    let mut seated = 0;
    let mut unseated = 0;

    for exam_id in &exam_ids {
        let Some(exam) = exams.iter().find(|exam| exam.identity() == *exam_id) else {
            warn!(exam = %exam_id, "Session lists an unregistered exam, skipping");
            continue;
        };

        for student in sorted
            .iter()
            .filter(|student| student.is_eligible(exam, venue.is_aara()))
        {
            let desk = if rows == 0 {
                None
            } else {
                session.desk_mut((next - 1) % rows, (next - 1) / rows)
            };
            match desk {
                Some(desk) => {
                    desk.assign(Occupant::new(student, exam_id));
                    seated += 1;
                }
                None => unseated += 1,
            }

            if mode == SeatingMode::Sparse && rows > 0 && next % rows == 0 {
                next += rows;
            }
            next += 1;
        }

        debug!(exam = %exam_id, next_desk = next, "Seated exam block");
        next += inter_gap;
    }

    if unseated > 0 {
        warn!(
            session = %session.identity(),
            unseated,
            "Layout ran past the end of the desk grid"
        );
    }
    info!(
        session = %session.identity(),
        %mode,
        seated,
        inter_gap,
        "Allocated desks"
    );

    Allocation::Seated(AllocationReport {
        seated,
        unseated,
        mode,
        inter_gap,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use eb_core::{Exam, ExamKind, Registry, Session, Subject, Venue};

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn student(lui: u64, family: &str, subject: &Subject, aara: bool) -> Student {
        let dob = NaiveDate::from_ymd_opt(2007, 5, 1).unwrap();
        let mut student = Student::new(lui, "Sam Lee", family, dob, "Blue", aara);
        student.add_subject(&subject.identity());
        student
    }

    /// A venue of `rows` x `columns` with one session holding `subjects`
    /// exams, and the given students registered.
    fn setup(
        rows: usize,
        columns: usize,
        subjects: &[&Subject],
        students: Vec<Student>,
    ) -> (Registry, String) {
        let mut registry = Registry::new();
        let venue = Venue::new("V1", 1, vec!["R1".to_owned()], rows, columns, rows * columns, false);
        let mut session = Session::new(&venue, 1, day(), nine());

        for subject in subjects {
            registry.add((*subject).clone()).unwrap();
            let exam = Exam::new(subject, ExamKind::External, day(), nine());
            let enrolled = students
                .iter()
                .filter(|s| s.is_eligible(&exam, false))
                .count();
            session.schedule_exam(&exam.identity(), enrolled);
            registry.add(exam).unwrap();
        }
        for student in students {
            registry.add(student).unwrap();
        }
        registry.add(venue).unwrap();
        let id = registry.add(session).unwrap();
        (registry, id)
    }

    fn seated_at(registry: &Registry, session: &str, row: usize, column: usize) -> Option<String> {
        registry
            .get::<Session>(session)
            .unwrap()
            .desk(row, column)
            .and_then(|desk| desk.occupant())
            .map(|occupant| occupant.family_name.clone())
    }

    #[test]
    fn test_choose_mode_boundaries() {
        assert_eq!(SeatingMode::choose(0, 10), (SeatingMode::Sparse, 5));
        assert_eq!(SeatingMode::choose(4, 9), (SeatingMode::Dense, 5));
        assert_eq!(SeatingMode::choose(0, 0), (SeatingMode::Dense, 0));
    }

    #[test]
    fn test_sparse_skips_a_column() {
        let physics = Subject::new("Physics", "Motion.");
        let students = (1..=7)
            .map(|n| student(n, &format!("Name{n:02}"), &physics, false))
            .collect();
        let (mut registry, id) = setup(3, 6, &[&physics], students);

        let allocation = allocate(
            registry.session_context(&id).unwrap(),
            &AllocationConfig::default(),
        );
        let report = allocation.report().unwrap();
        assert_eq!(report.mode, SeatingMode::Sparse);
        assert_eq!(report.seated, 7);

        // Column 0 full, column 1 skipped, column 2 full, column 3 skipped.
        assert_eq!(seated_at(&registry, &id, 2, 0).as_deref(), Some("Name03"));
        assert_eq!(seated_at(&registry, &id, 0, 1), None);
        assert_eq!(seated_at(&registry, &id, 0, 2).as_deref(), Some("Name04"));
        assert_eq!(seated_at(&registry, &id, 0, 4).as_deref(), Some("Name07"));
    }

    #[test]
    fn test_inter_gap_separates_exams() {
        let art = Subject::new("Art", "Paint.");
        let music = Subject::new("Music", "Sound.");
        let students = vec![
            student(1, "Adams", &art, false),
            student(2, "Brown", &art, false),
            student(3, "Clark", &music, false),
        ];
        let (mut registry, id) = setup(2, 3, &[&art, &music], students);

        let report = allocate(
            registry.session_context(&id).unwrap(),
            &AllocationConfig::default(),
        );
        let report = report.report().unwrap().clone();
        assert_eq!(report.mode, SeatingMode::Dense);
        assert_eq!(report.inter_gap, 3);

        let session = registry.get::<Session>(&id).unwrap();
        let numbers: Vec<usize> = session
            .desks()
            .iter()
            .filter(|desk| !desk.is_empty())
            .map(eb_core::Desk::number)
            .collect();
        assert_eq!(numbers, [1, 2, 6]);
    }

    #[test]
    fn test_sparse_skip_and_inter_gap_combine() {
        let art = Subject::new("Art", "Paint.");
        let music = Subject::new("Music", "Sound.");
        let students = vec![
            student(1, "Adams", &art, false),
            student(2, "Brown", &art, false),
            student(3, "Clark", &art, false),
            student(4, "Davis", &music, false),
            student(5, "Evans", &music, false),
        ];
        let (mut registry, id) = setup(3, 6, &[&art, &music], students);

        let allocation = allocate(
            registry.session_context(&id).unwrap(),
            &AllocationConfig::default(),
        );
        let report = allocation.report().unwrap();
        assert_eq!(report.mode, SeatingMode::Sparse);
        assert_eq!(report.inter_gap, 4);
        assert_eq!(report.seated, 5);

        // Art fills column 0, column 1 is skipped, then four desks of gap.
        let session = registry.get::<Session>(&id).unwrap();
        let seated: Vec<(usize, &str)> = session
            .desks()
            .iter()
            .filter_map(|desk| {
                desk.occupant()
                    .map(|occupant| (desk.number(), occupant.family_name.as_str()))
            })
            .collect();
        assert_eq!(
            seated,
            [(1, "Adams"), (2, "Brown"), (3, "Clark"), (11, "Davis"), (12, "Evans")]
        );
    }

    #[test]
    fn test_reset_desks_false_keeps_stale_occupants() {
        let art = Subject::new("Art", "Paint.");
        let (mut registry, id) = setup(2, 2, &[&art], vec![student(1, "Adams", &art, false)]);

        let stale = Occupant {
            lui: 99,
            family_name: "Ghost".to_owned(),
            given_and_initial: "G".to_owned(),
            exam_id: "art_20250310".to_owned(),
        };
        registry
            .get_mut::<Session>(&id)
            .unwrap()
            .desk_by_number_mut(4)
            .unwrap()
            .assign(stale);

        let keep = AllocationConfig { reset_desks: false };
        allocate(registry.session_context(&id).unwrap(), &keep);
        assert_eq!(seated_at(&registry, &id, 1, 1).as_deref(), Some("Ghost"));

        allocate(
            registry.session_context(&id).unwrap(),
            &AllocationConfig::default(),
        );
        assert_eq!(seated_at(&registry, &id, 1, 1), None);
        assert_eq!(seated_at(&registry, &id, 0, 0).as_deref(), Some("Adams"));
    }

    #[test]
    fn test_allocation_serializes_with_outcome_tag() {
        let overflow = Allocation::Overflow {
            students: 5,
            desks: 4,
        };
        let json = serde_json::to_string(&overflow).unwrap();
        assert_eq!(json, r#"{"outcome":"overflow","students":5,"desks":4}"#);
    }
}

//! Exam sessions and their desk grids.

use std::fmt::{self, Write as _};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Desk, Exam, Venue};
use crate::identity::{Describe, Entity, EntityKind};
use crate::registry::{Registry, Table};

/// One sitting in a venue: a day, a start time, the exams sat together, and
/// the desk grid students are seated at.
///
/// Desks are numbered column-major: desk `n` sits at row `(n - 1) % rows`
/// and column `(n - 1) / rows`.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use eb_core::{Entity, Session, Venue};
///
/// let venue = Venue::new("V1", 1, vec!["R1".into()], 5, 2, 10, false);
/// let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let start = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
/// let session = Session::new(&venue, 1, day, start);
///
/// assert_eq!(session.identity(), "V1#1");
/// assert_eq!(session.desks().len(), 10);
/// assert_eq!(session.desk(1, 1).map(|desk| desk.number()), Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    venue_id: String,
    session_number: u32,
    day: NaiveDate,
    start: NaiveTime,
    exams: Vec<String>,
    rows: usize,
    columns: usize,
    total_desks: usize,
    student_count: usize,
    desks: Vec<Desk>,
}

impl Session {
    /// Creates an empty session with a desk grid sized from `venue`.
    #[must_use]
    pub fn new(venue: &Venue, session_number: u32, day: NaiveDate, start: NaiveTime) -> Self {
        let rows = venue.rows();
        let columns = venue.columns();
        Self {
            venue_id: venue.id().to_owned(),
            session_number,
            day,
            start,
            exams: Vec::new(),
            rows,
            columns,
            total_desks: venue.desk_count(),
            student_count: 0,
            desks: (1..=rows * columns).map(Desk::new).collect(),
        }
    }

    /// Returns the id of the venue the session is held in.
    #[must_use]
    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    /// Returns the session number, unique within its venue.
    #[must_use]
    pub const fn session_number(&self) -> u32 {
        self.session_number
    }

    /// Returns the day of the session.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// Returns the start time of the session.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// Returns `true` if the session is held on `day` at `start`.
    #[must_use]
    pub fn is_at(&self, day: NaiveDate, start: NaiveTime) -> bool {
        self.day == day && self.start == start
    }

    /// Returns the identities of the exams sat in this session, in
    /// scheduling order.
    #[must_use]
    pub fn exams(&self) -> &[String] {
        &self.exams
    }

    /// Returns `true` if the exam is scheduled in this session.
    #[must_use]
    pub fn has_exam(&self, exam_id: &str) -> bool {
        self.exams.iter().any(|id| id == exam_id)
    }

    /// Returns the number of desk rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of desk columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the number of usable desks.
    #[must_use]
    pub const fn desk_count(&self) -> usize {
        self.total_desks
    }

    /// Returns the number of students enrolled across every exam.
    #[must_use]
    pub const fn student_count(&self) -> usize {
        self.student_count
    }

    /// Returns the number of desks still free for new enrolments.
    #[must_use]
    pub const fn remaining_desks(&self) -> usize {
        self.total_desks.saturating_sub(self.student_count)
    }

    /// Adds an exam with `students` enrolments.
    ///
    /// Scheduling an exam that is already present only adds its students.
    pub fn schedule_exam(&mut self, exam_id: &str, students: usize) {
        if !self.has_exam(exam_id) {
            self.exams.push(exam_id.to_owned());
        }
        self.student_count += students;
    }

    /// Returns every desk in desk-number order.
    #[must_use]
    pub fn desks(&self) -> &[Desk] {
        &self.desks
    }

    /// Returns the desk at a grid position.
    #[must_use]
    pub fn desk(&self, row: usize, column: usize) -> Option<&Desk> {
        self.grid_index(row, column).and_then(|i| self.desks.get(i))
    }

    /// Returns the desk at a grid position for seating.
    pub fn desk_mut(&mut self, row: usize, column: usize) -> Option<&mut Desk> {
        self.grid_index(row, column)
            .and_then(|i| self.desks.get_mut(i))
    }

    /// Returns a desk by its 1-based number.
    pub fn desk_by_number_mut(&mut self, number: usize) -> Option<&mut Desk> {
        number.checked_sub(1).and_then(|i| self.desks.get_mut(i))
    }

    /// Returns the number of occupied desks.
    #[must_use]
    pub fn occupied_desks(&self) -> usize {
        self.desks.iter().filter(|desk| !desk.is_empty()).count()
    }

    /// Removes every occupant.
    pub fn clear_desks(&mut self) {
        self.desks.iter_mut().for_each(Desk::clear);
    }

    const fn grid_index(&self, row: usize, column: usize) -> Option<usize> {
        if row < self.rows && column < self.columns {
            Some(column * self.rows + row)
        } else {
            None
        }
    }

    /// Renders the desk grid row by row in cells `column_width` wide.
    ///
    /// Each grid row is three text lines (desk label, family name, given
    /// name and initial) followed by a blank line.
    #[must_use]
    pub fn print_desks(&self, column_width: usize) -> String {
        let mut out = String::new();
        for row in 0..self.rows {
            let cells: Vec<&Desk> = (0..self.columns)
                .filter_map(|column| self.desk(row, column))
                .collect();

            for desk in &cells {
                let label = format!("Desk {}", desk.number());
                let _ = write!(out, "{label:<column_width$}");
            }
            out.push('\n');
            for desk in &cells {
                let family = desk.occupant().map_or("", |o| o.family_name.as_str());
                let _ = write!(out, "{family:<column_width$}");
            }
            out.push('\n');
            for desk in &cells {
                let given = desk
                    .occupant()
                    .map_or("", |o| o.given_and_initial.as_str());
                let _ = write!(out, "{given:<column_width$}");
            }
            out.push_str("\n\n");
        }
        out
    }
}

impl Entity for Session {
    const KIND: EntityKind = EntityKind::Session;

    fn identity(&self) -> String {
        format!("{}#{}", self.venue_id, self.session_number)
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.sessions
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.sessions
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} {}",
            self.venue_id,
            self.session_number,
            self.day.format("%Y-%m-%d"),
            self.start.format("%H:%M")
        )
    }
}

impl Describe for Session {
    fn full_detail(&self, registry: &Registry) -> String {
        let mut out = format!(
            "{self}\nStudents: {}, Desks: {}\n",
            self.student_count, self.total_desks
        );
        for exam in self.exams.iter().filter_map(|id| registry.find::<Exam>(id)) {
            let _ = writeln!(out, "    {exam}");
        }
        out
    }
}

//! Desks and their occupants.

use serde::{Deserialize, Serialize};

use super::Student;

/// The student seated at a desk, captured at allocation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// The student's Learner Unique Identifier.
    pub lui: u64,
    /// The student's family name.
    pub family_name: String,
    /// First given name plus the initial of the second, if any.
    pub given_and_initial: String,
    /// Identity of the exam the student sits at this desk.
    pub exam_id: String,
}

impl Occupant {
    /// Captures `student` sitting `exam_id`.
    #[must_use]
    pub fn new(student: &Student, exam_id: &str) -> Self {
        Self {
            lui: student.lui(),
            family_name: student.family_name().to_owned(),
            given_and_initial: given_and_initial(student.given_names()),
            exam_id: exam_id.to_owned(),
        }
    }
}

/// One desk of a session grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Desk {
    number: usize,
    occupant: Option<Occupant>,
}

impl Desk {
    /// Creates an empty desk.
    #[must_use]
    pub const fn new(number: usize) -> Self {
        Self {
            number,
            occupant: None,
        }
    }

    /// Returns the 1-based desk number.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Returns the seated student, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    /// Returns `true` if nobody is seated here.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Seats an occupant, replacing any previous one.
    pub fn assign(&mut self, occupant: Occupant) {
        self.occupant = Some(occupant);
    }

    /// Removes the occupant.
    pub fn clear(&mut self) {
        self.occupant = None;
    }
}

/// Formats given names as the first name plus the initial of the second.
///
/// # Examples
///
/// ```
/// use eb_core::given_and_initial;
///
/// assert_eq!(given_and_initial("Liam Alexander"), "Liam A.");
/// assert_eq!(given_and_initial("Ava"), "Ava");
/// ```
#[must_use]
pub fn given_and_initial(given: &str) -> String {
    let mut names = given.split_whitespace();
    let first = names.next().unwrap_or_default();
    match names.next().and_then(|second| second.chars().next()) {
        Some(initial) => format!("{first} {initial}."),
        None => first.to_owned(),
    }
}

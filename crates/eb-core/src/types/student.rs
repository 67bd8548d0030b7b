//! Year 12 students.

use std::fmt::{self, Write as _};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Exam, Subject};
use crate::error::RegistryError;
use crate::identity::{Describe, Entity, EntityKind};
use crate::registry::{Registry, Table};

/// Largest Learner Unique Identifier that fits in ten digits.
pub const MAX_LUI: u64 = 9_999_999_999;

/// A Year 12 student.
///
/// Subject and exam lists hold identity strings. They grow by reference
/// as the student is enrolled and scheduled; nothing is copied.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use eb_core::{Entity, Student};
///
/// let dob = NaiveDate::from_ymd_opt(2007, 12, 8).unwrap();
/// let student = Student::new(9_999_365_663, "Liam Alexander", "Smith", dob, "Blue", false);
///
/// assert_eq!(student.identity(), "9999365663");
/// assert_eq!(student.short_name(), "Liam Smith");
/// assert_eq!(student.full_name(), "Liam Alexander Smith");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    lui: u64,
    given: String,
    family: String,
    dob: NaiveDate,
    house: String,
    aara: bool,
    subjects: SmallVec<[String; 6]>,
    exams: SmallVec<[String; 6]>,
}

impl Student {
    /// Creates a student with no subjects and no exams.
    pub fn new(
        lui: u64,
        given: impl Into<String>,
        family: impl Into<String>,
        dob: NaiveDate,
        house: impl Into<String>,
        aara: bool,
    ) -> Self {
        Self {
            lui,
            given: given.into().trim().to_owned(),
            family: family.into().trim().to_owned(),
            dob,
            house: house.into().trim().to_owned(),
            aara,
            subjects: SmallVec::new(),
            exams: SmallVec::new(),
        }
    }

    /// Returns the Learner Unique Identifier.
    #[must_use]
    pub const fn lui(&self) -> u64 {
        self.lui
    }

    /// Returns all given names, space separated.
    #[must_use]
    pub fn given_names(&self) -> &str {
        &self.given
    }

    /// Returns the family name.
    #[must_use]
    pub fn family_name(&self) -> &str {
        &self.family
    }

    /// Returns the first given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.given.split_whitespace().next().unwrap_or_default()
    }

    /// Returns the first given name followed by the family name.
    #[must_use]
    pub fn short_name(&self) -> String {
        format!("{} {}", self.first_name(), self.family)
    }

    /// Returns every given name followed by the family name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given, self.family)
    }

    /// Returns the date of birth.
    #[must_use]
    pub const fn date_of_birth(&self) -> NaiveDate {
        self.dob
    }

    /// Returns the house name.
    #[must_use]
    pub fn house(&self) -> &str {
        &self.house
    }

    /// Returns `true` if the student sits exams under access arrangements.
    #[must_use]
    pub const fn is_aara(&self) -> bool {
        self.aara
    }

    /// Returns the identities of the subjects the student takes.
    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Returns `true` if the student takes the subject.
    #[must_use]
    pub fn takes(&self, subject_id: &str) -> bool {
        self.subjects.iter().any(|id| id == subject_id)
    }

    /// Enrols the student in a subject. Enrolling twice has no effect.
    pub fn add_subject(&mut self, subject_id: &str) {
        if !self.takes(subject_id) {
            self.subjects.push(subject_id.to_owned());
        }
    }

    /// Withdraws the student from a subject, returning `true` if they took it.
    pub fn remove_subject(&mut self, subject_id: &str) -> bool {
        let before = self.subjects.len();
        self.subjects.retain(|id| id != subject_id);
        self.subjects.len() != before
    }

    /// Returns the identities of the exams the student is scheduled for.
    #[must_use]
    pub fn exams(&self) -> &[String] {
        &self.exams
    }

    /// Schedules the student for an exam. Scheduling twice has no effect.
    pub fn add_exam(&mut self, exam_id: &str) {
        if !self.exams.iter().any(|id| id == exam_id) {
            self.exams.push(exam_id.to_owned());
        }
    }

    /// Returns `true` if the student should sit `exam` in a venue with the
    /// given AARA flag.
    #[must_use]
    pub fn is_eligible(&self, exam: &Exam, venue_aara: bool) -> bool {
        self.aara == venue_aara && self.takes(exam.subject_id())
    }
}

impl Entity for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn identity(&self) -> String {
        format!("{:010}", self.lui)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.lui == 0 || self.lui > MAX_LUI {
            return Err(RegistryError::invalid(
                Self::KIND,
                format!("LUI {} is not a 10-digit learner id", self.lui),
            ));
        }
        if self.family.is_empty() || self.given.is_empty() {
            return Err(RegistryError::invalid(
                Self::KIND,
                format!("student {:010} has an empty name", self.lui),
            ));
        }
        Ok(())
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.students
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.students
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010} {}", self.lui, self.short_name())
    }
}

impl Describe for Student {
    fn full_detail(&self, registry: &Registry) -> String {
        let subjects: Vec<&str> = self
            .subjects
            .iter()
            .filter_map(|id| registry.find::<Subject>(id))
            .map(Subject::title)
            .collect();

        let mut out = format!("{self}\n{}\n", subjects.join(", "));
        for exam in self.exams.iter().filter_map(|id| registry.find::<Exam>(id)) {
            let _ = writeln!(out, "{exam}");
        }
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> Student {
        let dob = NaiveDate::from_ymd_opt(2007, 12, 8).unwrap();
        Student::new(9_999_365_663, "Liam Alexander", "Smith", dob, "Blue", false)
    }

    #[test]
    fn test_names() {
        let student = student();
        assert_eq!(student.first_name(), "Liam");
        assert_eq!(student.given_names(), "Liam Alexander");
        assert_eq!(student.family_name(), "Smith");
        assert_eq!(student.to_string(), "9999365663 Liam Smith");
    }

    #[test]
    fn test_subject_enrolment_is_idempotent() {
        let mut student = student();
        student.add_subject("physics__forces");
        student.add_subject("physics__forces");
        assert_eq!(student.subjects().len(), 1);
        assert!(student.takes("physics__forces"));

        assert!(student.remove_subject("physics__forces"));
        assert!(!student.remove_subject("physics__forces"));
        assert!(student.subjects().is_empty());
    }

    #[test]
    fn test_add_exam_is_idempotent() {
        let mut student = student();
        student.add_exam("physics_20250310");
        student.add_exam("physics_20250310");
        assert_eq!(student.exams(), ["physics_20250310"]);
    }

    #[test]
    fn test_eleven_digit_lui_rejected() {
        let dob = NaiveDate::from_ymd_opt(2007, 1, 1).unwrap();
        let student = Student::new(10_000_000_000, "Ann", "Lee", dob, "Red", false);
        assert!(matches!(
            student.validate(),
            Err(RegistryError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn test_leading_zero_lui_is_valid() {
        let dob = NaiveDate::from_ymd_opt(2007, 1, 1).unwrap();
        let student = Student::new(42, "Ann", "Lee", dob, "Red", false);
        assert!(student.validate().is_ok());
        assert_eq!(student.to_string(), "0000000042 Ann Lee");
        assert_eq!(student.identity(), "0000000042");
    }

    #[test]
    fn test_full_detail_resolves_titles() {
        let mut registry = Registry::new();
        let subject = Subject::new("Physics", "Forces.");
        let id = registry.add(subject).unwrap();
        let mut student = student();
        student.add_subject(&id);

        let detail = student.full_detail(&registry);
        assert!(detail.starts_with("9999365663 Liam Smith\nPhysics\n"));
        assert!(detail.ends_with(&format!("{}\n", "=".repeat(60))));
    }
}

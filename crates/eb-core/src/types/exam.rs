//! Internal and external exams.

use std::fmt::{self, Write as _};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Subject;
use crate::identity::{Describe, Entity, EntityKind, slugify};
use crate::registry::{Registry, Table};

/// Whether an exam is set by the school or by the external authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamKind {
    /// A school-set assessment.
    Internal,
    /// An externally set assessment.
    External,
}

impl ExamKind {
    /// Returns the persisted token (`INTERNAL`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::External => "EXTERNAL",
        }
    }

    /// Returns the title-case label used in exam titles (`Internal`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::External => "External",
        }
    }

    /// Parses a persisted token, ignoring ASCII case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("INTERNAL") {
            Some(Self::Internal)
        } else if token.eq_ignore_ascii_case("EXTERNAL") {
            Some(Self::External)
        } else {
            None
        }
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled exam for one subject.
///
/// The identity is the subject title slug plus the exam date. Time, paper
/// and unit are not part of it, so a second exam for the same subject on
/// the same day is rejected as a duplicate when registered.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use eb_core::{Entity, Exam, ExamKind, Subject};
///
/// let subject = Subject::new("Physics", "Forces.");
/// let exam = Exam::new(
///     &subject,
///     ExamKind::External,
///     NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
///     NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
/// )
/// .with_paper('1');
///
/// assert_eq!(exam.identity(), "physics_20250310");
/// assert_eq!(exam.short_title(), "Year 12 External Assessment Physics Paper 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    subject_id: String,
    subject_title: String,
    kind: ExamKind,
    paper: Option<char>,
    subtitle: Option<String>,
    unit: Option<char>,
    date: NaiveDate,
    time: NaiveTime,
}

impl Exam {
    /// Creates an exam with no paper, subtitle or unit.
    #[must_use]
    pub fn new(subject: &Subject, kind: ExamKind, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            subject_id: subject.identity(),
            subject_title: subject.title().to_owned(),
            kind,
            paper: None,
            subtitle: None,
            unit: None,
            date,
            time,
        }
    }

    /// Sets the paper identifier.
    #[must_use]
    pub const fn with_paper(mut self, paper: char) -> Self {
        self.paper = Some(paper);
        self
    }

    /// Sets the subtitle. A blank subtitle is ignored.
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into().trim().to_owned();
        self.subtitle = (!subtitle.is_empty()).then_some(subtitle);
        self
    }

    /// Sets the unit identifier.
    #[must_use]
    pub const fn with_unit(mut self, unit: char) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Returns the identity of the subject.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Returns the subject title.
    #[must_use]
    pub fn subject_title(&self) -> &str {
        &self.subject_title
    }

    /// Returns the exam kind.
    #[must_use]
    pub const fn kind(&self) -> ExamKind {
        self.kind
    }

    /// Returns the paper identifier.
    #[must_use]
    pub const fn paper(&self) -> Option<char> {
        self.paper
    }

    /// Returns the subtitle.
    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Returns the unit identifier.
    #[must_use]
    pub const fn unit(&self) -> Option<char> {
        self.unit
    }

    /// Returns the exam date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the start of the exam window.
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Returns the one-line title: kind, subject and paper.
    #[must_use]
    pub fn short_title(&self) -> String {
        let mut title = format!(
            "Year 12 {} Assessment {}",
            self.kind.label(),
            self.subject_title
        );
        if let Some(paper) = self.paper {
            title.push_str(" Paper ");
            title.push(paper);
        }
        title
    }

    /// Returns the multi-line title used on printed desk maps.
    #[must_use]
    pub fn title(&self) -> String {
        let mut title = format!(
            "Year 12 {} Assessment\n{}",
            self.kind.label(),
            self.subject_title
        );
        if let Some(paper) = self.paper {
            title.push_str(" Paper ");
            title.push(paper);
        }
        if let Some(subtitle) = &self.subtitle {
            title.push('\n');
            title.push_str(subtitle);
        }
        title.push('\n');
        title
    }

    /// Returns the persisted metadata line, without a line terminator.
    ///
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use eb_core::{Exam, ExamKind, Subject};
    ///
    /// let subject = Subject::new("General Mathematics", "Networks.");
    /// let exam = Exam::new(
    ///     &subject,
    ///     ExamKind::Internal,
    ///     NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
    ///     NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
    /// )
    /// .with_unit('3');
    ///
    /// assert_eq!(
    ///     exam.metadata(),
    ///     "Subject: General Mathematics, Exam Type: INTERNAL, Unit: 3, Exam Date: 2025-03-11 08:30"
    /// );
    /// ```
    #[must_use]
    pub fn metadata(&self) -> String {
        let mut line = format!(
            "Subject: {}, Exam Type: {}",
            self.subject_title, self.kind
        );
        if let Some(paper) = self.paper {
            line.push_str(", Paper: ");
            line.push(paper);
        }
        if let Some(subtitle) = &self.subtitle {
            line.push_str(", Subtitle: ");
            line.push_str(subtitle);
        }
        if let Some(unit) = self.unit {
            line.push_str(", Unit: ");
            line.push(unit);
        }
        let _ = write!(
            line,
            ", Exam Date: {} {}",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M")
        );
        line
    }
}

impl Entity for Exam {
    const KIND: EntityKind = EntityKind::Exam;

    fn identity(&self) -> String {
        format!(
            "{}_{}",
            slugify(&self.subject_title),
            self.date.format("%Y%m%d")
        )
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.exams
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.exams
    }
}

impl fmt::Display for Exam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_title())
    }
}

impl Describe for Exam {
    fn full_detail(&self, _registry: &Registry) -> String {
        format!("{}\n{}\n", self.short_title(), self.metadata())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam(day: u32, hour: u32) -> Exam {
        let subject = Subject::new("Physics", "Forces.");
        Exam::new(
            &subject,
            ExamKind::External,
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_identity_ignores_time_and_paper() {
        let morning = exam(10, 8);
        let afternoon = exam(10, 13).with_paper('2');
        assert_eq!(morning.identity(), afternoon.identity());
    }

    #[test]
    fn test_same_day_second_exam_is_duplicate() {
        let mut registry = Registry::new();
        registry.add(exam(10, 8)).unwrap();
        let err = registry.add(exam(10, 13).with_paper('2')).unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_title_with_subtitle() {
        let exam = exam(10, 8).with_paper('1').with_subtitle("Short response");
        assert_eq!(
            exam.title(),
            "Year 12 External Assessment\nPhysics Paper 1\nShort response\n"
        );
    }

    #[test]
    fn test_blank_subtitle_ignored() {
        assert_eq!(exam(10, 8).with_subtitle("  ").subtitle(), None);
    }

    #[test]
    fn test_metadata_with_paper_and_subtitle() {
        let exam = exam(12, 13).with_paper('1').with_subtitle("Part A, reading");
        assert_eq!(
            exam.metadata(),
            "Subject: Physics, Exam Type: EXTERNAL, Paper: 1, Subtitle: Part A, reading, Exam Date: 2025-03-12 13:00"
        );
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ExamKind::parse("external"), Some(ExamKind::External));
        assert_eq!(ExamKind::parse(" INTERNAL "), Some(ExamKind::Internal));
        assert_eq!(ExamKind::parse("mock"), None);
    }
}

//! Per-entity streaming in and out of the text format.
//!
//! Each entity knows how to write its own lines and how to rebuild itself
//! from them. References are never written as pointers: the reader
//! recomputes the identity it expects from the surrounding text and asks
//! the registry for it.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use eb_core::{
    Entity, EntityKind, Exam, ExamKind, Occupant, Registry, RegistryError, Room, Session, Student,
    Subject, Unit, Venue, slugify,
};
use tracing::debug;

use crate::error::{AtLine, CodecError};
use crate::fields::{DATE_FORMAT, Fields, TIME_FORMAT, item_text, strip_key, unquote};
use crate::lines::{LineReader, LineWriter};

/// Where an item sits in its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based ordinal of this item.
    pub nth: usize,
    /// Item count declared by the section header.
    pub declared: usize,
}

/// An entity with a fixed-format representation in the text format.
pub trait Streamable: Entity {
    /// Writes this entity's lines, numbered `nth`. The trailing blank
    /// separator is written by the caller.
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError>;

    /// Reads one entity, registers it, and returns its identity.
    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError>;
}

fn read_item<R: BufRead>(
    lines: &mut LineReader<R>,
    kind: EntityKind,
    position: Position,
) -> Result<(usize, String), CodecError> {
    let (line, text) = lines.expect(&format!("{} item {}", kind.name(), position.nth))?;
    let rest = item_text(line, &text, kind, position.nth, position.declared)?;
    Ok((line, rest))
}

fn register<T: Entity>(registry: &mut Registry, entity: T, line: usize) -> Result<String, CodecError> {
    let identity = registry.add(entity).at_line(line)?;
    debug!(kind = %T::KIND, identity = %identity, line, "Loaded entity");
    Ok(identity)
}

impl Streamable for Subject {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        _registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!("{nth}. {self}"))?;
        out.line(self.title())?;
        out.line(format_args!("\"{}\"", self.description()))?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, heading) = read_item(lines, Self::KIND, position)?;
        let (line, title) = lines.expect("subject title")?;
        if title.to_uppercase() != heading {
            return Err(CodecError::format(
                line,
                format!("subject title '{title}' does not match heading '{heading}'"),
            ));
        }
        let (line, description) = lines.expect("subject description")?;
        let description = unquote(line, &description)?;

        register(registry, Self::new(title, description), first)
    }
}

impl Streamable for Unit {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        _registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!("{nth}. {}", self.subject_id()))?;
        out.line(self)?;
        out.line(format_args!("\"{}\"", self.description()))?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, subject_id) = read_item(lines, Self::KIND, position)?;
        let subject = registry.get::<Subject>(&subject_id).at_line(first)?.clone();

        let (line, text) = lines.expect("unit title")?;
        let malformed = || {
            CodecError::format(
                line,
                format!("expected '<subject>, Unit <id>: <title>', found '{text}'"),
            )
        };
        let (subject_title, rest) = text.split_once(", Unit ").ok_or_else(malformed)?;
        let (unit_id, title) = rest.split_once(": ").ok_or_else(malformed)?;
        let mut chars = unit_id.chars();
        let (Some(unit_id), None) = (chars.next(), chars.next()) else {
            return Err(malformed());
        };
        if subject_title != subject.title() {
            return Err(CodecError::format(
                line,
                format!(
                    "unit subject '{subject_title}' does not match '{}'",
                    subject.title()
                ),
            ));
        }

        let (line, description) = lines.expect("unit description")?;
        let description = unquote(line, &description)?;

        register(registry, Self::new(&subject, unit_id, title, description), first)
    }
}

const STUDENT_KEYS: &[&str] = &[
    "LUI",
    "Family Name",
    "Given Name(s)",
    "Date of Birth",
    "House",
    "AARA",
];

impl Streamable for Student {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        let mut titles = Vec::with_capacity(self.subjects().len());
        for id in self.subjects() {
            let subject = registry.get::<Subject>(id).at_line(out.line_number() + 3)?;
            titles.push(subject.title());
        }

        out.line(format_args!("{nth}. {}", self.full_name().to_uppercase()))?;
        out.line(format_args!(
            "LUI: {:010}, Family Name: {}, Given Name(s): {}, Date of Birth: {}, House: {}, AARA: {}",
            self.lui(),
            self.family_name(),
            self.given_names(),
            self.date_of_birth().format(DATE_FORMAT),
            self.house(),
            self.is_aara()
        ))?;
        out.line(format_args!("Subjects: {}", titles.join(", ")))?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, _name) = read_item(lines, Self::KIND, position)?;

        let (line, text) = lines.expect("student details")?;
        let fields = Fields::parse(line, &text, STUDENT_KEYS)?;
        let mut student = Self::new(
            fields.parse_value("LUI")?,
            fields.require("Given Name(s)")?,
            fields.require("Family Name")?,
            fields.date("Date of Birth")?,
            fields.require("House")?,
            fields.flag("AARA")?,
        );

        let (line, text) = lines.expect("student subjects")?;
        let titles = strip_key(line, &text, "Subjects:")?;
        for title in titles.split(", ").map(str::trim).filter(|t| !t.is_empty()) {
            let subject = registry.resolve::<Subject>(&slugify(title)).at_line(line)?;
            student.add_subject(&subject.identity());
        }

        register(registry, student, first)
    }
}

const EXAM_KEYS: &[&str] = &[
    "Subject",
    "Exam Type",
    "Paper",
    "Subtitle",
    "Unit",
    "Exam Date",
];

impl Streamable for Exam {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        _registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!("{nth}. {}", self.short_title()))?;
        out.line(self.metadata())?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, short_title) = read_item(lines, Self::KIND, position)?;

        let (line, text) = lines.expect("exam details")?;
        let fields = Fields::parse(line, &text, EXAM_KEYS)?;
        let subject_title = fields.require("Subject")?;
        let subject = registry
            .resolve::<Subject>(&slugify(subject_title))
            .at_line(line)?;
        let kind_token = fields.require("Exam Type")?;
        let kind = ExamKind::parse(kind_token).ok_or_else(|| {
            CodecError::format(line, format!("invalid Exam Type '{kind_token}'"))
        })?;
        let when = fields.date_time("Exam Date")?;

        let mut exam = Self::new(subject, kind, when.date(), when.time());
        if let Some(paper) = fields.single_char("Paper")? {
            exam = exam.with_paper(paper);
        }
        if let Some(subtitle) = fields.get("Subtitle") {
            exam = exam.with_subtitle(subtitle);
        }
        if let Some(unit) = fields.single_char("Unit")? {
            exam = exam.with_unit(unit);
        }

        if exam.short_title() != short_title {
            return Err(CodecError::format(
                first,
                format!(
                    "exam heading '{short_title}' does not match its details ('{}')",
                    exam.short_title()
                ),
            ));
        }

        register(registry, exam, first)
    }
}

impl Streamable for Room {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        _registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!("{nth}. {}", self.id()))?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, id) = read_item(lines, Self::KIND, position)?;
        register(registry, Self::new(id), first)
    }
}

const VENUE_KEYS: &[&str] = &["Room Count", "Rooms", "Rows", "Columns", "Desks", "AARA"];

impl Streamable for Venue {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        _registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!("{nth}. {self}"))?;
        out.line(self.metadata())?;
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, heading) = read_item(lines, Self::KIND, position)?;
        let id = heading
            .split_once(" (")
            .map_or(heading.as_str(), |(id, _)| id)
            .to_owned();

        let (line, text) = lines.expect("venue details")?;
        let fields = Fields::parse(line, &text, VENUE_KEYS)?;
        let rooms: Vec<String> = fields
            .require("Rooms")?
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        for room in &rooms {
            registry.get::<Room>(room).at_line(line)?;
        }

        let rows = fields.parse_value("Rows")?;
        let columns = fields.parse_value("Columns")?;
        if Self::grid_size(rows, columns).is_none() {
            return Err(CodecError::format(
                line,
                format!(
                    "a {rows} by {columns} desk grid exceeds {} desks",
                    Self::MAX_GRID_DESKS
                ),
            ));
        }

        let venue = Self::new(
            id,
            fields.parse_value("Room Count")?,
            rooms,
            rows,
            columns,
            fields.parse_value("Desks")?,
            fields.flag("AARA")?,
        );
        register(registry, venue, first)
    }
}

const SESSION_KEYS: &[&str] = &["Venue", "Session Number", "Day", "Start", "Exams"];
const DESK_KEYS: &[&str] = &["Desk", "LUI", "Name"];

/// Recovers the subject title from an exam's short title.
fn subject_from_short_title(title: &str) -> Option<&str> {
    let rest = title.strip_prefix("Year 12 ")?;
    let rest = rest
        .strip_prefix("Internal Assessment ")
        .or_else(|| rest.strip_prefix("External Assessment "))?;
    match rest.rsplit_once(" Paper ") {
        Some((subject, paper)) if paper.chars().count() == 1 => Some(subject),
        _ => Some(rest),
    }
}

fn exam_identity(subject_title: &str, day: NaiveDate) -> String {
    format!("{}_{}", slugify(subject_title), day.format("%Y%m%d"))
}

impl Streamable for Session {
    fn stream_out<W: Write>(
        &self,
        out: &mut LineWriter<W>,
        registry: &Registry,
        nth: usize,
    ) -> Result<(), CodecError> {
        out.line(format_args!(
            "{nth}. Venue: {}, Session Number: {}, Day: {}, Start: {}, Exams: {}",
            self.venue_id(),
            self.session_number(),
            self.day().format(DATE_FORMAT),
            self.start().format(TIME_FORMAT),
            self.exams().len()
        ))?;

        for exam_id in self.exams() {
            let exam = registry.get::<Exam>(exam_id).at_line(out.line_number() + 1)?;
            let seated: Vec<_> = self
                .desks()
                .iter()
                .filter_map(|desk| desk.occupant().map(|o| (desk.number(), o)))
                .filter(|(_, occupant)| occupant.exam_id == *exam_id)
                .collect();

            out.line(exam.short_title())?;
            out.line(format_args!("[Desks: {}]", seated.len()))?;
            for (number, occupant) in seated {
                out.line(format_args!(
                    "Desk: {number}, LUI: {:010}, Name: {}, {}",
                    occupant.lui, occupant.family_name, occupant.given_and_initial
                ))?;
            }
        }
        Ok(())
    }

    fn stream_in<R: BufRead>(
        lines: &mut LineReader<R>,
        registry: &mut Registry,
        position: Position,
    ) -> Result<String, CodecError> {
        let (first, heading) = read_item(lines, Self::KIND, position)?;
        let fields = Fields::parse(first, &heading, SESSION_KEYS)?;
        let venue = registry
            .get::<Venue>(fields.require("Venue")?)
            .at_line(first)?
            .clone();
        let day = fields.date("Day")?;
        let start = fields.time("Start")?;
        let mut session = Self::new(&venue, fields.parse_value("Session Number")?, day, start);
        let exam_count: usize = fields.parse_value("Exams")?;

        for _ in 0..exam_count {
            let (line, title) = lines.expect("session exam title")?;
            let subject_title = subject_from_short_title(&title).ok_or_else(|| {
                CodecError::format(line, format!("'{title}' is not an exam title"))
            })?;
            let exam_id = exam_identity(subject_title, day);
            let exam = registry.get::<Exam>(&exam_id).at_line(line)?;
            if exam.short_title() != title {
                return Err(CodecError::reference(
                    line,
                    RegistryError::not_found(EntityKind::Exam, title),
                ));
            }
            if exam.time() != start {
                return Err(CodecError::format(
                    line,
                    format!(
                        "exam {exam_id} starts at {}, not at the session start {}",
                        exam.time().format(TIME_FORMAT),
                        start.format(TIME_FORMAT)
                    ),
                ));
            }

            let (line, text) = lines.expect("[Desks: N]")?;
            let seated: usize = text
                .strip_prefix("[Desks:")
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|count| count.trim().parse().ok())
                .ok_or_else(|| {
                    CodecError::format(line, format!("expected '[Desks: N]', found '{text}'"))
                })?;

            for _ in 0..seated {
                let (line, text) = lines.expect("desk line")?;
                let desk = Fields::parse(line, &text, DESK_KEYS)?;
                let number: usize = desk.parse_value("Desk")?;
                let lui: u64 = desk.parse_value("LUI")?;
                let student = registry.get::<Student>(&format!("{lui:010}")).at_line(line)?;
                session
                    .desk_by_number_mut(number)
                    .ok_or_else(|| {
                        CodecError::format(
                            line,
                            format!("desk {number} is outside the {} desk grid", venue.id()),
                        )
                    })?
                    .assign(Occupant::new(student, &exam_id));
            }

            let eligible: Vec<String> = registry
                .all::<Student>()
                .iter()
                .filter(|student| student.is_eligible(exam, venue.is_aara()))
                .map(Entity::identity)
                .collect();
            session.schedule_exam(&exam_id, eligible.len());
            for id in &eligible {
                registry.get_mut::<Student>(id).at_line(line)?.add_exam(&exam_id);
            }
        }

        register(registry, session, first)
    }
}

//! Deserializing a dataset from the text format.

use std::io::BufRead;

use eb_core::{EntityKind, Exam, Registry, Room, Session, Student, Subject, Unit, Venue};
use tracing::{debug, info};

use crate::error::CodecError;
use crate::fields::is_item_line;
use crate::lines::LineReader;
use crate::stream::{Position, Streamable};

/// Everything a dataset file holds.
#[derive(Debug, Clone)]
pub struct Document {
    /// The dataset title.
    pub title: String,
    /// The dataset version.
    pub version: f64,
    /// Every entity, registered in file order.
    pub registry: Registry,
}

/// Reads a complete dataset into a fresh registry.
///
/// The first error stops the read. Nothing outside the returned
/// [`Document`] is touched, so a failed read leaves the caller's state as
/// it was.
///
/// # Examples
///
/// ```
/// use eb_codec::{ErrorKind, read_dataset};
///
/// let text = "Title: Term 1\nVersion: 1.0\n[Begin]\n[Rooms: 1]\n1. R1\n\n[End]\n";
/// let document = read_dataset(text.as_bytes()).unwrap();
/// assert_eq!(document.title, "Term 1");
///
/// let broken = "Title: Term 1\nVersion: 1.0\n[Begin]\n[Teachers: 0]\n[End]\n";
/// assert_eq!(read_dataset(broken.as_bytes()).unwrap_err().kind(), ErrorKind::Structural);
/// ```
pub fn read_dataset<R: BufRead>(input: R) -> Result<Document, CodecError> {
    let mut lines = LineReader::new(input);

    let (line, text) = lines.expect("Title:")?;
    let title = text
        .strip_prefix("Title:")
        .map(|title| title.trim().to_owned())
        .ok_or_else(|| CodecError::structural(line, format!("expected 'Title:', found '{text}'")))?;

    let (line, text) = lines.expect("Version:")?;
    let version = text
        .strip_prefix("Version:")
        .ok_or_else(|| CodecError::structural(line, format!("expected 'Version:', found '{text}'")))?
        .trim();
    let version: f64 = version
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite() && *v > 0.0)
        .ok_or_else(|| CodecError::format(line, format!("invalid version '{version}'")))?;

    let (line, text) = lines.expect("[Begin]")?;
    if text != "[Begin]" {
        return Err(CodecError::structural(
            line,
            format!("expected '[Begin]', found '{text}'"),
        ));
    }

    let mut registry = Registry::new();
    loop {
        let Some((line, text)) = lines.next_line()? else {
            return Err(CodecError::structural(
                lines.line_number(),
                "missing '[End]' marker",
            ));
        };
        if text == "[End]" {
            break;
        }

        let (kind, declared) = section_header(line, &text)?;
        read_section(&mut lines, &mut registry, kind, declared)?;

        if let Some(next) = lines.peek()? {
            if is_item_line(next) {
                return Err(CodecError::sequence(
                    lines.line_number(),
                    format!(
                        "{} section declared {declared} items but has more",
                        kind.section_name()
                    ),
                ));
            }
        }
    }

    info!(
        title = %title,
        version,
        subjects = registry.len::<Subject>(),
        students = registry.len::<Student>(),
        exams = registry.len::<Exam>(),
        sessions = registry.len::<Session>(),
        "Read exam block dataset"
    );
    Ok(Document {
        title,
        version,
        registry,
    })
}

fn section_header(line: usize, text: &str) -> Result<(EntityKind, usize), CodecError> {
    let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) else {
        if is_item_line(text) {
            return Err(CodecError::sequence(
                line,
                format!("item '{text}' found outside any section's declared count"),
            ));
        }
        return Err(CodecError::structural(
            line,
            format!("expected a section header, found '{text}'"),
        ));
    };

    let (name, count) = inner.split_once(':').ok_or_else(|| {
        CodecError::structural(line, format!("malformed section header '{text}'"))
    })?;
    let kind = EntityKind::from_section_name(name.trim()).ok_or_else(|| {
        CodecError::structural(line, format!("unknown section '{}'", name.trim()))
    })?;
    let count = count.trim().parse().map_err(|_| {
        CodecError::format(line, format!("invalid item count in '{text}'"))
    })?;
    Ok((kind, count))
}

fn read_section<R: BufRead>(
    lines: &mut LineReader<R>,
    registry: &mut Registry,
    kind: EntityKind,
    declared: usize,
) -> Result<(), CodecError> {
    match kind {
        EntityKind::Subject => read_items::<Subject, R>(lines, registry, declared),
        EntityKind::Unit => read_items::<Unit, R>(lines, registry, declared),
        EntityKind::Student => read_items::<Student, R>(lines, registry, declared),
        EntityKind::Exam => read_items::<Exam, R>(lines, registry, declared),
        EntityKind::Room => read_items::<Room, R>(lines, registry, declared),
        EntityKind::Venue => read_items::<Venue, R>(lines, registry, declared),
        EntityKind::Session => read_items::<Session, R>(lines, registry, declared),
    }
}

fn read_items<T: Streamable, R: BufRead>(
    lines: &mut LineReader<R>,
    registry: &mut Registry,
    declared: usize,
) -> Result<(), CodecError> {
    for nth in 1..=declared {
        T::stream_in(lines, registry, Position { nth, declared })?;
    }
    debug!(section = T::KIND.section_name(), items = declared, "Read section");
    Ok(())
}

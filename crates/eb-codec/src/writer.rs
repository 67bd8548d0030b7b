//! Serializing a registry to the text format.

use std::io::Write;

use eb_core::{Exam, Registry, Room, RoomKind, Session, Student, Subject, Unit, Venue};
use tracing::{debug, info};

use crate::error::CodecError;
use crate::lines::LineWriter;
use crate::stream::Streamable;

/// Formats a version with at least one decimal digit.
///
/// # Examples
///
/// ```
/// use eb_codec::format_version;
///
/// assert_eq!(format_version(1.0), "1.0");
/// assert_eq!(format_version(2.25), "2.25");
/// ```
#[must_use]
pub fn format_version(version: f64) -> String {
    if version.fract() == 0.0 {
        format!("{version:.1}")
    } else {
        version.to_string()
    }
}

/// Writes a complete dataset.
///
/// Sections are written in dependency order so that every reference points
/// at an entity the reader has already seen. The Rooms section holds only
/// plain rooms; venues are written once, in their own section.
pub fn write_dataset<W: Write>(
    out: W,
    title: &str,
    version: f64,
    registry: &Registry,
) -> Result<(), CodecError> {
    let mut out = LineWriter::new(out);

    out.line(format_args!("Title: {title}"))?;
    out.line(format_args!("Version: {}", format_version(version)))?;
    out.line("[Begin]")?;

    write_section(&mut out, registry, registry.all::<Subject>().iter())?;
    write_section(&mut out, registry, registry.all::<Unit>().iter())?;
    write_section(&mut out, registry, registry.all::<Student>().iter())?;
    write_section(&mut out, registry, registry.all::<Exam>().iter())?;

    let rooms = registry.rooms();
    let plain: Vec<&Room> = rooms
        .iter()
        .filter_map(|room| match room {
            RoomKind::Plain(room) => Some(*room),
            RoomKind::Venue(_) => None,
        })
        .collect();
    write_section(&mut out, registry, plain.into_iter())?;

    write_section(&mut out, registry, registry.all::<Venue>().iter())?;
    write_section(&mut out, registry, registry.all::<Session>().iter())?;

    out.line("[End]")?;
    out.flush()?;

    info!(
        title,
        version,
        lines = out.line_number(),
        "Wrote exam block dataset"
    );
    Ok(())
}

fn write_section<'a, T, W>(
    out: &mut LineWriter<W>,
    registry: &Registry,
    items: impl ExactSizeIterator<Item = &'a T>,
) -> Result<(), CodecError>
where
    T: Streamable + 'a,
    W: Write,
{
    out.line(format_args!("[{}: {}]", T::KIND.section_name(), items.len()))?;
    for (index, item) in items.enumerate() {
        item.stream_out(out, registry, index + 1)?;
        out.blank()?;
    }
    debug!(section = T::KIND.section_name(), "Wrote section");
    Ok(())
}

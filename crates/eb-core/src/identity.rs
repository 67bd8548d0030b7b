//! Identity scheme shared by every registered entity.
//!
//! An identity is a deterministic string computed only from an entity's own
//! fields. The codec never stores references; it recomputes the identity it
//! expects from context and asks the [`Registry`] for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::registry::{Registry, Table};

/// The kind tag under which entities are registered.
///
/// The declaration order is the dependency order of the persisted
/// sections: each kind may only reference kinds declared before it.
///
/// # Examples
///
/// ```
/// use eb_core::EntityKind;
///
/// assert_eq!(EntityKind::Subject.section_name(), "Subjects");
/// assert_eq!(EntityKind::from_section_name("Venues"), Some(EntityKind::Venue));
/// assert_eq!(EntityKind::from_section_name("Teachers"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A Year 12 subject.
    Subject,
    /// A semester unit of a subject.
    Unit,
    /// A Year 12 student.
    Student,
    /// A scheduled exam.
    Exam,
    /// A plain room.
    Room,
    /// A room (or group of rooms) set up for exams.
    Venue,
    /// An exam session held in a venue.
    Session,
}

impl EntityKind {
    /// Every kind, in section order.
    pub const ALL: [Self; 7] = [
        Self::Subject,
        Self::Unit,
        Self::Student,
        Self::Exam,
        Self::Room,
        Self::Venue,
        Self::Session,
    ];

    /// Returns the singular display name (`Subject`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Subject => "Subject",
            Self::Unit => "Unit",
            Self::Student => "Student",
            Self::Exam => "Exam",
            Self::Room => "Room",
            Self::Venue => "Venue",
            Self::Session => "Session",
        }
    }

    /// Returns the section header name used by the text format (`Subjects`).
    #[must_use]
    pub const fn section_name(self) -> &'static str {
        match self {
            Self::Subject => "Subjects",
            Self::Unit => "Units",
            Self::Student => "Students",
            Self::Exam => "Exams",
            Self::Room => "Rooms",
            Self::Venue => "Venues",
            Self::Session => "Sessions",
        }
    }

    /// Looks a kind up by its section header name.
    #[must_use]
    pub fn from_section_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section_name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An entity that can be stored in the [`Registry`].
///
/// `identity` must be a pure function of the entity's own fields, never of
/// registry state. Two entities of the same kind with equal identities
/// cannot both be registered.
pub trait Entity: Sized {
    /// The registry table this entity belongs to.
    const KIND: EntityKind;

    /// Returns the derived identity string.
    fn identity(&self) -> String;

    /// Returns an optional secondary lookup key.
    ///
    /// Aliases let a reference that only carries part of the identity (for
    /// example a subject title without its description) still resolve. The
    /// first entity registered under an alias keeps it.
    fn alias(&self) -> Option<String> {
        None
    }

    /// Checks field constraints before registration.
    ///
    /// The default accepts every value.
    fn validate(&self) -> Result<(), RegistryError> {
        Ok(())
    }

    #[doc(hidden)]
    fn table(registry: &Registry) -> &Table<Self>;

    #[doc(hidden)]
    fn table_mut(registry: &mut Registry) -> &mut Table<Self>;
}

/// Detailed human-readable dump of an entity.
///
/// [`Display`](fmt::Display) gives the brief form; `full_detail` may consult
/// the registry to expand references into titles.
pub trait Describe {
    /// Returns the detailed, multi-line description.
    fn full_detail(&self, registry: &Registry) -> String;
}

/// Normalizes free text into an identity fragment.
///
/// Lowercases the text, collapses every run of characters outside
/// `[a-z0-9]` into a single `_`, and trims leading and trailing `_`.
///
/// # Examples
///
/// ```
/// use eb_core::slugify;
///
/// assert_eq!(slugify("Ancient History"), "ancient_history");
/// assert_eq!(slugify("  Maths: Methods & Specialist! "), "maths_methods_specialist");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("Essential   English"), "essential_english");
        assert_eq!(slugify("Physics -- Unit 3"), "physics_unit_3");
    }

    #[test]
    fn test_slugify_trims_separators() {
        assert_eq!(slugify("...Chemistry..."), "chemistry");
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_non_ascii_is_separator() {
        assert_eq!(slugify("Café Studies"), "caf_studies");
    }

    #[test]
    fn test_section_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_section_name(kind.section_name()), Some(kind));
        }
    }

    #[test]
    fn test_kind_order_matches_dependencies() {
        assert!(EntityKind::Subject < EntityKind::Unit);
        assert!(EntityKind::Room < EntityKind::Venue);
        assert!(EntityKind::Venue < EntityKind::Session);
    }
}

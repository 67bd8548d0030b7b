//! Semester units.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Subject;
use crate::identity::{Describe, Entity, EntityKind, slugify};
use crate::registry::{Registry, Table};

/// A semester unit of a subject.
///
/// The identity folds in every text field, including the description, so
/// an edit to any of them yields a different unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    subject_id: String,
    subject_title: String,
    unit_id: char,
    title: String,
    description: String,
}

impl Unit {
    /// Creates a unit of `subject`.
    pub fn new(
        subject: &Subject,
        unit_id: char,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject.identity(),
            subject_title: subject.title().to_owned(),
            unit_id,
            title: title.into().trim().to_owned(),
            description: description.into().trim().to_owned(),
        }
    }

    /// Returns the identity of the owning subject.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Returns the title of the owning subject.
    #[must_use]
    pub fn subject_title(&self) -> &str {
        &self.subject_title
    }

    /// Returns the single-character unit id.
    #[must_use]
    pub const fn unit_id(&self) -> char {
        self.unit_id
    }

    /// Returns the unit title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the unit description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Entity for Unit {
    const KIND: EntityKind = EntityKind::Unit;

    fn identity(&self) -> String {
        format!(
            "{}__{}__{}__{}",
            slugify(&self.subject_title),
            self.unit_id.to_ascii_lowercase(),
            slugify(&self.title),
            slugify(&self.description)
        )
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.units
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.units
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Unit {}: {}",
            self.subject_title, self.unit_id, self.title
        )
    }
}

impl Describe for Unit {
    fn full_detail(&self, _registry: &Registry) -> String {
        format!("{self}\n\"{}\"\n", self.description)
    }
}

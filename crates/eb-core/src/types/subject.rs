//! Year 12 subjects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::identity::{Describe, Entity, EntityKind, slugify};
use crate::registry::{Registry, Table};

/// A Year 12 subject.
///
/// The identity combines the title and description slugs so that two
/// subjects sharing a title can coexist. The title slug alone is kept as
/// an alias, which is how students and exams refer to a subject.
///
/// # Examples
///
/// ```
/// use eb_core::{Entity, Subject};
///
/// let subject = Subject::new("General Mathematics", "Statistics and networks.");
/// assert_eq!(subject.identity(), "general_mathematics__statistics_and_networks");
/// assert_eq!(subject.alias().as_deref(), Some("general_mathematics"));
/// assert_eq!(subject.to_string(), "GENERAL MATHEMATICS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    title: String,
    description: String,
}

impl Subject {
    /// Creates a subject. Surrounding whitespace is trimmed from both fields.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into().trim().to_owned(),
            description: description.into().trim().to_owned(),
        }
    }

    /// Returns the subject title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the subject description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Entity for Subject {
    const KIND: EntityKind = EntityKind::Subject;

    fn identity(&self) -> String {
        format!("{}__{}", slugify(&self.title), slugify(&self.description))
    }

    fn alias(&self) -> Option<String> {
        Some(slugify(&self.title))
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if slugify(&self.title).is_empty() {
            return Err(RegistryError::invalid(
                Self::KIND,
                format!("title '{}' has no letters or digits", self.title),
            ));
        }
        Ok(())
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.subjects
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.subjects
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title.to_uppercase())
    }
}

impl Describe for Subject {
    fn full_detail(&self, _registry: &Registry) -> String {
        format!("{self}\n{}\n\"{}\"\n", self.title, self.description)
    }
}

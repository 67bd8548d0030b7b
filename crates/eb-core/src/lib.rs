//! Core registry, identity scheme, and entity model for exam block scheduling.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`Registry`] - the single source of truth for every entity instance,
//!   keyed by entity kind and a derived identity string
//! - Entity types ([`Subject`], [`Unit`], [`Student`], [`Exam`], [`Room`],
//!   [`Venue`], [`Session`], [`Desk`])
//! - Error types ([`RegistryError`], [`ConfigError`])
//! - Configuration structures ([`Config`])
//!
//! # Identity
//!
//! Entities never hold pointers to each other. Every cross-reference is an
//! identity string that the referencing entity can recompute from context,
//! which is what lets the text format round-trip without a reference syntax.
//!
//! ```
//! use eb_core::{Registry, Subject};
//!
//! let mut registry = Registry::new();
//! let id = registry.add(Subject::new("Ancient History", "Study the past.")).unwrap();
//!
//! assert_eq!(id, "ancient_history__study_the_past");
//! assert!(registry.resolve::<Subject>("ancient_history").is_ok());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod registry;
pub mod types;

pub use config::{AllocationConfig, Config, DatasetConfig, LayoutConfig};
pub use error::{ConfigError, RegistryError};
pub use identity::{Describe, Entity, EntityKind, slugify};
pub use registry::{Registry, RoomKind, SessionContext, Table};
pub use types::{
    Desk, Exam, ExamKind, Occupant, Room, Session, Student, Subject, Unit, Venue, given_and_initial,
};

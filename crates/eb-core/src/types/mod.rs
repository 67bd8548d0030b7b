//! Entity types for exam block scheduling.
//!
//! Every entity is a plain value. Cross-references are identity strings,
//! never pointers, and are resolved through the [`Registry`](crate::Registry).
//!
//! # Module Organization
//!
//! - [`subject`] - Subjects and their title aliases
//! - [`unit`] - Semester units of a subject
//! - [`student`] - Students with subject and exam enrolments
//! - [`exam`] - Internal and external exams
//! - [`room`] - Plain rooms and exam venues
//! - [`session`] - Venue sessions and their desk grids
//! - [`desk`] - Single desks and their occupants
//!
//! All public types are re-exported at this module level and at the crate
//! root:
//!
//! ```
//! use eb_core::{Exam, Session, Student, Venue};
//! ```

mod desk;
mod exam;
mod room;
mod session;
mod student;
mod subject;
mod unit;

pub use desk::{Desk, Occupant, given_and_initial};
pub use exam::{Exam, ExamKind};
pub use room::{Room, Venue};
pub use session::Session;
pub use student::Student;
pub use subject::Subject;
pub use unit::Unit;

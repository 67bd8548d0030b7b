//! Streaming text codec for exam block datasets.
//!
//! This crate reads and writes the line-oriented dataset format:
//!
//! - [`write_dataset`] / [`read_dataset`] - whole-dataset serialization
//! - [`Streamable`] - per-entity `stream_out` / `stream_in`
//! - [`ExamBlock`] - a loaded dataset with title, version and observers
//! - [`CodecError`] - every read or write failure, classified by [`ErrorKind`]
//!
//! # Format
//!
//! ```text
//! Title: Exam Block Model
//! Version: 1.0
//! [Begin]
//! [Subjects: 1]
//! 1. PHYSICS
//! Physics
//! "Forces and motion."
//!
//! [Units: 0]
//! ...
//! [End]
//! ```
//!
//! Sections are written in dependency order and every item starts with its
//! 1-based ordinal. References between items are identity strings that the
//! reader recomputes from context; there is no pointer syntax.
//!
//! # Failure
//!
//! Reading stops at the first error. The error carries the line number and
//! the partially built registry is dropped.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod dataset;
pub mod error;
mod fields;
pub mod lines;
pub mod reader;
pub mod stream;
pub mod writer;

pub use dataset::{ExamBlock, ModelObserver};
pub use error::{CodecError, ErrorKind};
pub use lines::{LineReader, LineWriter};
pub use reader::{Document, read_dataset};
pub use stream::{Position, Streamable};
pub use writer::{format_version, write_dataset};

//! Session planning and desk allocation for exam blocks.
//!
//! - [`allocate`] - deterministic seating of one session's students
//! - [`SessionPlanner`] - session lookup, creation and exam scheduling
//! - [`BlockSummary`] - JSON-ready occupancy overview
//!
//! Allocation runs after a dataset is fully loaded. It never fails: a
//! session with more students than desks comes back as
//! [`Allocation::Overflow`] with its desks untouched.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod allocation;
pub mod error;
pub mod planner;
pub mod summary;

pub use allocation::{Allocation, AllocationReport, SeatingMode, allocate};
pub use error::ScheduleError;
pub use planner::SessionPlanner;
pub use summary::{BlockSummary, SessionSummary};

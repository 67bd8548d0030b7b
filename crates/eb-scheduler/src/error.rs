//! Error types for the eb-scheduler crate.

use eb_core::RegistryError;

/// Errors raised while planning sessions or allocating desks.
///
/// Rejections ([`is_rejection`](Self::is_rejection)) are refused operations:
/// the registry is exactly as it was before the call. The remaining
/// variants mean the registry itself is inconsistent or output failed.
///
/// # Examples
///
/// ```
/// use eb_scheduler::ScheduleError;
///
/// let err = ScheduleError::CapacityExceeded {
///     venue: "V1".to_owned(),
///     students: 31,
///     desks: 30,
/// };
/// assert!(err.is_rejection());
/// assert_eq!(err.to_string(), "venue V1 has 30 desks, 31 students will not fit");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The students would not fit at the venue's desks.
    #[error("venue {venue} has {desks} desks, {students} students will not fit")]
    CapacityExceeded {
        /// The venue id.
        venue: String,
        /// Students the session would hold.
        students: usize,
        /// Desks available.
        desks: usize,
    },

    /// No session matches the request.
    #[error("no session in venue {venue} {detail}")]
    NoSession {
        /// The venue id.
        venue: String,
        /// What was looked for.
        detail: String,
    },

    /// The exam is not held at the session's day and start time.
    #[error("exam {exam} is not held at the time of session {session}")]
    TimeMismatch {
        /// The session identity.
        session: String,
        /// The exam identity.
        exam: String,
    },

    /// The exam already has a session in this venue.
    #[error("exam {exam} is already scheduled in session {session}")]
    AlreadyScheduled {
        /// The session identity.
        session: String,
        /// The exam identity.
        exam: String,
    },

    /// The venue's highest session number is already the largest possible.
    #[error("venue {venue} has no session numbers left")]
    SessionNumbersExhausted {
        /// The venue id.
        venue: String,
    },

    /// A referenced entity is missing from the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Writing a desk printout failed.
    #[error("failed to write allocations: {0}")]
    Io(#[from] std::io::Error),
}

impl ScheduleError {
    /// Returns `true` for refused operations that left the registry unchanged.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. }
                | Self::NoSession { .. }
                | Self::TimeMismatch { .. }
                | Self::AlreadyScheduled { .. }
                | Self::SessionNumbersExhausted { .. }
        )
    }
}

//! Error types for the eb-codec crate.
//!
//! This module provides [`CodecError`] for every failure while reading or
//! writing the text format, and [`ErrorKind`] to classify them.

use camino::Utf8PathBuf;
use eb_core::RegistryError;

/// Coarse classification of a [`CodecError`].
///
/// Callers that only need to decide how to report a failure match on this
/// rather than on the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An entity's derived identity was already registered.
    DuplicateIdentity,
    /// A reference resolved to nothing.
    NotFound,
    /// A line or token has the wrong shape.
    Format,
    /// An item ordinal or item count disagrees with its section.
    Sequence,
    /// A file marker is missing or a section header is unknown.
    Structural,
    /// The underlying stream failed.
    Io,
}

/// Errors raised while reading or writing a dataset.
///
/// Every read error is fatal: the load stops at the first one and the
/// partially built registry is dropped. Variants that come from parsing
/// carry the 1-based line number where the problem was detected.
///
/// # Error Recovery Strategy
///
/// None. A caller keeps whatever dataset it had before the failed load.
///
/// # Examples
///
/// ```
/// use eb_codec::{CodecError, ErrorKind};
///
/// let err = CodecError::sequence(12, "expected item 3, found item 4");
/// assert_eq!(err.kind(), ErrorKind::Sequence);
/// assert_eq!(err.line(), Some(12));
/// assert_eq!(err.to_string(), "line 12: expected item 3, found item 4");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A required marker is missing or a section header is not recognized.
    #[error("line {line}: {message}")]
    Structural {
        /// Line where the problem was detected.
        line: usize,
        /// What was expected.
        message: String,
    },

    /// A line does not match its expected shape or a value fails to parse.
    #[error("line {line}: {message}")]
    Format {
        /// Line where the problem was detected.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// An item ordinal is out of step or a section has the wrong item count.
    #[error("line {line}: {message}")]
    Sequence {
        /// Line where the problem was detected.
        line: usize,
        /// What was out of step.
        message: String,
    },

    /// A registry operation failed while resolving or registering an entity.
    #[error("line {line}: {source}")]
    Reference {
        /// Line where the problem was detected.
        line: usize,
        /// The registry failure.
        #[source]
        source: RegistryError,
    },

    /// The input ended in the middle of the dataset.
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Number of lines read before the input ended.
        line: usize,
        /// What the reader was looking for.
        expected: String,
    },

    /// A dataset file could not be opened or created.
    #[error("failed to open {path}: {source}")]
    Open {
        /// The file that could not be opened.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Creates a new [`CodecError::Structural`] error.
    pub fn structural(line: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            line,
            message: message.into(),
        }
    }

    /// Creates a new [`CodecError::Format`] error.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Creates a new [`CodecError::Sequence`] error.
    pub fn sequence(line: usize, message: impl Into<String>) -> Self {
        Self::Sequence {
            line,
            message: message.into(),
        }
    }

    /// Creates a new [`CodecError::Reference`] error.
    pub const fn reference(line: usize, source: RegistryError) -> Self {
        Self::Reference { line, source }
    }

    /// Creates a new [`CodecError::UnexpectedEof`] error.
    pub fn eof(line: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            line,
            expected: expected.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Structural { .. } | Self::UnexpectedEof { .. } => ErrorKind::Structural,
            Self::Format { .. } => ErrorKind::Format,
            Self::Sequence { .. } => ErrorKind::Sequence,
            Self::Reference { source, .. } => match source {
                RegistryError::DuplicateIdentity { .. } => ErrorKind::DuplicateIdentity,
                RegistryError::NotFound { .. } => ErrorKind::NotFound,
                RegistryError::InvalidEntity { .. } => ErrorKind::Format,
            },
            Self::Open { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the line the error was detected on, if it came from parsing.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Structural { line, .. }
            | Self::Format { line, .. }
            | Self::Sequence { line, .. }
            | Self::Reference { line, .. }
            | Self::UnexpectedEof { line, .. } => Some(*line),
            Self::Open { .. } | Self::Io(_) => None,
        }
    }
}

/// Attaches a line number to registry failures.
pub(crate) trait AtLine<T> {
    fn at_line(self, line: usize) -> Result<T, CodecError>;
}

impl<T> AtLine<T> for Result<T, RegistryError> {
    fn at_line(self, line: usize) -> Result<T, CodecError> {
        self.map_err(|source| CodecError::reference(line, source))
    }
}

#[cfg(test)]
mod tests {
    use eb_core::EntityKind;

    use super::*;

    #[test]
    fn test_reference_kinds() {
        let dup = CodecError::reference(4, RegistryError::duplicate(EntityKind::Subject, "a__b"));
        assert_eq!(dup.kind(), ErrorKind::DuplicateIdentity);

        let missing = CodecError::reference(9, RegistryError::not_found(EntityKind::Room, "R9"));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "line 9: no Room with identity 'R9'");
    }

    #[test]
    fn test_eof_is_structural() {
        let err = CodecError::eof(40, "[End]");
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("expected [End]"));
    }

    #[test]
    fn test_io_has_no_line() {
        let err = CodecError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_at_line() {
        let result: Result<(), RegistryError> =
            Err(RegistryError::not_found(EntityKind::Exam, "physics_20250310"));
        let err = result.at_line(17).unwrap_err();
        assert_eq!(err.line(), Some(17));
    }
}

//! Failure types for construction, insertion, and cursor use.

use core::fmt;

/// Construction parameters were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The expected element count was zero. Callers that have no estimate
    /// should leave the builder's default in place rather than passing 0.
    ZeroExpectedCount,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroExpectedCount => write!(f, "expected element count cannot be zero"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Error returned when an insert would duplicate an existing key.
/// Contains the element that could not be inserted, allowing recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateKey<T>(
    /// The element that could not be inserted.
    pub T,
);

impl<T> DuplicateKey<T> {
    /// Returns the element that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for DuplicateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an element with an equal key is already present")
    }
}

impl<T: fmt::Debug> std::error::Error for DuplicateKey<T> {}

/// Error returned when a cursor is advanced after the element it rested
/// on was removed from the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorInvalidated;

impl fmt::Display for CursorInvalidated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cursor rests on a removed element")
    }
}

impl std::error::Error for CursorInvalidated {}

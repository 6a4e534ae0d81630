//! Error types for unimerge-protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors raised while constructing protocol values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A course code was empty after trimming.
    #[error("course code is empty")]
    EmptyCourseCode,

    /// A day token did not name a weekday.
    #[error("unknown weekday: {0:?}")]
    InvalidDay(String),

    /// A venue name was empty after trimming.
    #[error("venue name is empty")]
    EmptyVenue,

    /// A requester id was empty after trimming.
    #[error("requester id is empty")]
    EmptyRequester,

    /// A role token named neither a student nor the venue authority.
    #[error("unknown role: {0:?}")]
    InvalidRole(String),
}

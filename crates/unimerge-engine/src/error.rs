//! Error types for unimerge-engine.

use thiserror::Error;
use unimerge_protocol::{CourseCode, RequesterId, SessionId, SessionState};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a negotiation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed request input; no session, ledger or store state was
    /// touched.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] unimerge_protocol::Error),

    /// An active (non-terminal) session already exists for this
    /// (requester, course) pair. The second request is rejected, not
    /// queued.
    #[error("{requester} is already negotiating {course}")]
    AlreadyNegotiating {
        requester: RequesterId,
        course: CourseCode,
    },

    /// Unknown session id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The requested move is not permitted by the state machine.
    #[error("session {session}: invalid transition {from} -> {to}")]
    InvalidTransition {
        session: SessionId,
        from: SessionState,
        to: SessionState,
    },

    /// The session already reached a terminal state.
    #[error("session {0} is already closed")]
    SessionClosed(SessionId),
}

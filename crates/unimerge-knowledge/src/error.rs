//! Error types for unimerge-knowledge.

use thiserror::Error;
use unimerge_protocol::Slot;

/// Result type for knowledge-base operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur against the knowledge base.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Another booking already holds the slot.
    #[error("slot already booked: {0}")]
    SlotTaken(Slot),
}

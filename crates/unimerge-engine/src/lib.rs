//! UniMerge Engine - the negotiation protocol engine and session registry.
//!
//! This crate drives the contract-net exchange between a requester and
//! the venue authority:
//!
//! - [`SessionRegistry`] tracks in-flight negotiations, enforces one
//!   active session per (requester, course) pair, validates state
//!   transitions, and holds each session's append-only message trace.
//! - [`NegotiationEngine`] runs CFP → PROPOSE/REFUSE → ACCEPT → INFORM
//!   against the shared knowledge base, validating the preferred slot
//!   against the constraint store and claiming it through the ledger's
//!   atomic check-and-insert.
//! - [`ProposalPolicy`] is the requester-side decision seam; the
//!   default [`AutoAccept`] takes the sole proposal as offered.
//!
//! Concurrency: same-slot contenders serialize on the ledger (exactly
//! one wins), same-pair contenders serialize on the registry (one
//! `AlreadyNegotiating`), and everything else proceeds in parallel.
//! Stalled sessions are closed by timeout with their reservation rolled
//! back.

pub mod engine;
pub mod error;
pub mod policy;
pub mod registry;

pub use engine::{EngineConfig, NegotiateRequest, NegotiateResult, NegotiationEngine, Outcome};
pub use error::{Error, Result};
pub use policy::{AutoAccept, Decision, ProposalPolicy};
pub use registry::{Session, SessionRegistry};

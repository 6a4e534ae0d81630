//! The requester-side decision seam.
//!
//! Step 7 of the protocol waits for the requester's verdict on the
//! authority's proposal. The observed deployment auto-accepts the sole
//! proposal (no counter-offer round is modeled), so [`AutoAccept`] is the
//! default; a policy returning [`Decision::Decline`] drives the
//! `PROPOSED -> REFUSED` transition instead. What triggers a decline is
//! an extension point for integrators, not something this crate decides.

use async_trait::async_trait;
use unimerge_protocol::Slot;

use crate::registry::Session;

/// The requester's verdict on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

/// Decides whether the requester accepts the proposed slot.
///
/// The engine awaits [`decide`](Self::decide) under its configured
/// timeout; a policy that stalls past it terminates the session as
/// `REFUSED` with a timeout reason.
#[async_trait]
pub trait ProposalPolicy: Send + Sync {
    async fn decide(&self, session: &Session, proposal: &Slot) -> Decision;
}

/// Accepts every proposal immediately (the default policy).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

#[async_trait]
impl ProposalPolicy for AutoAccept {
    async fn decide(&self, _session: &Session, _proposal: &Slot) -> Decision {
        Decision::Accept
    }
}

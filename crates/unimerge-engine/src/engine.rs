//! Negotiation Protocol Engine - drives the contract-net exchange.
//!
//! One call to [`NegotiationEngine::negotiate`] runs a whole negotiation
//! to its terminal state as a single logical unit of work:
//!
//! 1. Input is validated at [`NegotiateRequest`] construction; malformed
//!    requests fail before any state is touched.
//! 2. A session opens (one active negotiation per requester + course).
//! 3. CFP is recorded on the trace.
//! 4. The preferred slot is checked against the *live* constraint
//!    snapshot; a prohibited day refuses the session outright.
//! 5. The booking ledger's atomic check-and-insert reserves the slot; a
//!    conflict refuses the session.
//! 6. PROPOSE echoes the reserved slot back.
//! 7. The proposal policy decides under the engine timeout; the default
//!    auto-accepts, emitting ACCEPT.
//! 8. INFORM confirms; the step-5 record is now authoritative.
//!
//! The engine never holds a lock across an await; the only suspension
//! points are the knowledge-base lock acquisitions and the policy
//! decision. Sessions stalled past the timeout are closed by
//! [`reap_expired`](NegotiationEngine::reap_expired) with their
//! reservation rolled back, so an abandoned negotiation cannot shadow a
//! slot forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use unimerge_knowledge::{BookingLedger, ConstraintStore, Error as KnowledgeError};
use unimerge_protocol::{
    CourseCode, MessageBody, ProtocolMessage, RefusalReason, RequesterId, SessionId, SessionState,
    Slot, Weekday,
};

use crate::error::{Error, Result};
use crate::policy::{AutoAccept, Decision, ProposalPolicy};
use crate::registry::{now_millis, Session, SessionRegistry};

/// Capacity of the trace broadcast channel; slow observers lag and skip.
const TRACE_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the negotiation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Budget for a negotiation to complete. The policy wait in step 7 is
    /// bounded by it, and the reaper refuses sessions older than it.
    /// `None` disables both.
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl EngineConfig {
    /// Set the negotiation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the negotiation timeout.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// A validated negotiation request.
///
/// Constructing one is step 1 of the protocol: empty course codes,
/// unknown weekday tokens and empty venue/requester fields all fail here
/// as [`Error::InvalidRequest`], before any session, ledger or store
/// access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiateRequest {
    pub requester: RequesterId,
    pub course: CourseCode,
    pub slot: Slot,
}

impl NegotiateRequest {
    /// Build a request from already-validated values.
    pub fn new(requester: RequesterId, course: CourseCode, slot: Slot) -> Self {
        Self {
            requester,
            course,
            slot,
        }
    }

    /// Validate raw boundary input.
    pub fn parse(requester: &str, course: &str, venue: &str, day: &str) -> Result<Self> {
        let requester = RequesterId::new(requester)?;
        let course = CourseCode::new(course)?;
        let day: Weekday = day.parse()?;
        let slot = Slot::new(venue, day)?;
        Ok(Self {
            requester,
            course,
            slot,
        })
    }
}

/// Terminal outcome of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The booking is final and visible in the ledger.
    Confirmed { slot: Slot },
    /// The negotiation ran and rejected the proposal.
    Refused { reason: RefusalReason },
}

/// Result of a completed negotiation: the terminal session snapshot
/// (with its full trace) and the outcome.
#[derive(Debug, Clone)]
pub struct NegotiateResult {
    pub session: Session,
    pub outcome: Outcome,
}

/// The single negotiation authority.
///
/// Owns the session registry and message emission; shares the constraint
/// store and booking ledger with the boundary that mutates/reads them
/// out-of-band.
pub struct NegotiationEngine {
    registry: SessionRegistry,
    constraints: Arc<ConstraintStore>,
    ledger: Arc<BookingLedger>,
    policy: Box<dyn ProposalPolicy>,
    config: EngineConfig,
    trace_tx: broadcast::Sender<ProtocolMessage>,
}

impl NegotiationEngine {
    /// Create an engine over the shared knowledge base, with the default
    /// auto-accept policy and default config.
    pub fn new(constraints: Arc<ConstraintStore>, ledger: Arc<BookingLedger>) -> Self {
        let (trace_tx, _) = broadcast::channel(TRACE_CHANNEL_CAPACITY);
        Self {
            registry: SessionRegistry::new(),
            constraints,
            ledger,
            policy: Box::new(AutoAccept),
            config: EngineConfig::default(),
            trace_tx,
        }
    }

    /// Replace the proposal policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl ProposalPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replace the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one negotiation to its terminal state.
    ///
    /// Returns [`Error::AlreadyNegotiating`] without emitting anything if
    /// the (requester, course) pair already has an active session. Every
    /// other path terminates the session and reports the outcome - a
    /// refusal is an `Ok` result carrying [`Outcome::Refused`], since the
    /// protocol ran and rejected the proposal.
    pub async fn negotiate(&self, request: NegotiateRequest) -> Result<NegotiateResult> {
        let session = self
            .registry
            .open(
                request.requester.clone(),
                request.course.clone(),
                request.slot.clone(),
            )
            .await?;
        let id = session.id;
        info!(
            session = %id,
            requester = %request.requester,
            course = %request.course,
            slot = %request.slot,
            "negotiation opened"
        );

        let outcome = match self.run_protocol(id, &request).await {
            Ok(outcome) => outcome,
            // A concurrent abort or timeout reap closed the session under
            // us; report the recorded outcome instead of the lost race.
            Err(err @ (Error::SessionClosed(_) | Error::InvalidTransition { .. })) => {
                let snapshot = self.registry.get(id).await?;
                match (snapshot.state, snapshot.reason) {
                    (SessionState::Refused, Some(reason)) => Outcome::Refused { reason },
                    _ => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        let session = self.registry.get(id).await?;
        Ok(NegotiateResult { session, outcome })
    }

    /// Steps 3-8 against an open session.
    async fn run_protocol(&self, id: SessionId, request: &NegotiateRequest) -> Result<Outcome> {
        let slot = &request.slot;

        self.emit(
            id,
            MessageBody::Cfp {
                course: request.course.clone(),
                slot: slot.clone(),
            },
        )
        .await?;

        // Always the live constraint snapshot, never one cached at open.
        if self.constraints.is_prohibited(&slot.venue, slot.day).await {
            return self.close_refused(id, RefusalReason::DayProhibited).await;
        }

        match self
            .ledger
            .try_reserve(slot, &request.course, &request.requester)
            .await
        {
            Ok(_) => {}
            Err(KnowledgeError::SlotTaken(_)) => {
                return self.close_refused(id, RefusalReason::SlotTaken).await;
            }
        }
        if let Err(err) = self.registry.note_reservation(id, slot.clone()).await {
            // The session closed while we held a fresh ledger row that no
            // closer could see; rolling it back is ours.
            self.ledger.release(slot).await;
            return Err(err);
        }

        self.emit(id, MessageBody::Propose { slot: slot.clone() })
            .await?;
        let proposed = self.registry.transition(id, SessionState::Proposed).await?;

        let decision = match self.config.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.policy.decide(&proposed, slot)).await {
                    Ok(decision) => decision,
                    Err(_) => return self.close_refused(id, RefusalReason::TimedOut).await,
                }
            }
            None => self.policy.decide(&proposed, slot).await,
        };
        match decision {
            Decision::Accept => {}
            Decision::Decline => {
                return self.close_refused(id, RefusalReason::Declined).await;
            }
        }

        self.emit(id, MessageBody::Accept { slot: slot.clone() })
            .await?;
        self.registry.transition(id, SessionState::Accepted).await?;

        self.emit(
            id,
            MessageBody::Inform {
                course: request.course.clone(),
                slot: slot.clone(),
            },
        )
        .await?;
        self.registry
            .transition(id, SessionState::Confirmed)
            .await?;
        // The ledger row is authoritative now; nothing left to roll back.
        self.registry.clear_reservation(id).await?;

        info!(session = %id, slot = %slot, "negotiation confirmed");
        Ok(Outcome::Confirmed { slot: slot.clone() })
    }

    /// Abort an active, non-terminal session, releasing its reservation.
    ///
    /// Returns the terminal snapshot; [`Error::SessionClosed`] if the
    /// session already reached a terminal state.
    pub async fn abort(&self, id: SessionId) -> Result<Session> {
        self.close_refused(id, RefusalReason::Aborted).await?;
        self.registry.get(id).await
    }

    /// Refuse every non-terminal session older than the configured
    /// timeout, rolling back reservations. Returns how many were closed.
    /// No-op when the timeout is disabled.
    pub async fn reap_expired(&self) -> usize {
        let Some(timeout) = self.config.timeout else {
            return 0;
        };
        let cutoff = now_millis().saturating_sub(timeout.as_millis() as u64);

        let mut reaped = 0;
        for id in self.registry.expired(cutoff).await {
            match self.close_refused(id, RefusalReason::TimedOut).await {
                Ok(_) => reaped += 1,
                // Lost the race to the request task or an abort.
                Err(Error::SessionClosed(_)) | Err(Error::NotFound(_)) => {}
                Err(err) => warn!(session = %id, error = %err, "failed to reap session"),
            }
        }
        if reaped > 0 {
            info!(reaped, "reaped expired sessions");
        }
        reaped
    }

    /// Terminate a session as `REFUSED` and release its reservation.
    ///
    /// The registry hands the reservation to exactly one closer, so a
    /// request task, an abort and the reaper can all race here without
    /// double-releasing or touching another session's booking.
    async fn close_refused(&self, id: SessionId, reason: RefusalReason) -> Result<Outcome> {
        let (_, message, reservation) = self.registry.refuse(id, reason).await?;
        if let Some(slot) = reservation {
            self.ledger.release(&slot).await;
        }
        let _ = self.trace_tx.send(message);
        warn!(session = %id, reason = %reason, "negotiation refused");
        Ok(Outcome::Refused { reason })
    }

    /// Record a message on the session trace and fan it out to observers.
    async fn emit(&self, id: SessionId, body: MessageBody) -> Result<ProtocolMessage> {
        let message = self.registry.append(id, body).await?;
        debug!(
            session = %id,
            seq = message.seq,
            performative = %message.body.performative(),
            sender = %message.body.sender(),
            "message emitted"
        );
        let _ = self.trace_tx.send(message.clone());
        Ok(message)
    }

    /// Current snapshot of a session.
    pub async fn session(&self, id: SessionId) -> Result<Session> {
        self.registry.get(id).await
    }

    /// All sessions, ordered by id.
    pub async fn sessions(&self) -> Vec<Session> {
        self.registry.sessions().await
    }

    /// The ordered message trace of a session.
    pub async fn trace(&self, id: SessionId) -> Result<Vec<ProtocolMessage>> {
        Ok(self.registry.get(id).await?.messages)
    }

    /// Subscribe to every message the engine emits, across all sessions.
    pub fn subscribe_trace(&self) -> broadcast::Receiver<ProtocolMessage> {
        self.trace_tx.subscribe()
    }

    /// The shared constraint store.
    pub fn constraints(&self) -> &Arc<ConstraintStore> {
        &self.constraints
    }

    /// The shared booking ledger.
    pub fn ledger(&self) -> &Arc<BookingLedger> {
        &self.ledger
    }
}

//! Negotiation session registry.
//!
//! Tracks every negotiation from open to terminal state and owns the
//! per-(requester, course) exclusivity guard: a second request for a pair
//! with an active session is rejected with `AlreadyNegotiating`, never
//! queued. Terminal sessions stay in the registry for trace readback;
//! only the active-pair index entry is dropped, so a retry after
//! `CONFIRMED` or `REFUSED` opens a brand-new independent session.
//!
//! Each public operation is a single critical section under one write
//! lock, which is what makes `refuse` safe to race against the request
//! task: transition, reason, REFUSE trace record and the reservation
//! handoff all land atomically.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use unimerge_protocol::{
    CourseCode, MessageBody, ProtocolMessage, RefusalReason, RequesterId, SessionId, SessionState,
    Slot,
};

use crate::error::{Error, Result};

/// Snapshot of a negotiation session, including its ordered trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub requester: RequesterId,
    pub course: CourseCode,
    /// The requester's preferred slot (also the proposed slot under the
    /// default echo policy).
    pub slot: Slot,
    pub state: SessionState,
    /// Recorded refusal reason once the session terminates `REFUSED`.
    pub reason: Option<RefusalReason>,
    /// Unix-epoch milliseconds at session open.
    pub created_at: u64,
    /// Append-only message trace, ordered by emission.
    pub messages: Vec<ProtocolMessage>,
}

/// Registry-internal session record.
///
/// `reservation` is the slot this session inserted into the booking
/// ledger, held until the session either confirms (the row becomes
/// authoritative) or is refused (the closer takes the slot and releases
/// the row). Keeping it here lets `refuse` hand the slot to exactly one
/// caller.
#[derive(Debug)]
struct SessionRecord {
    session: Session,
    reservation: Option<Slot>,
}

impl SessionRecord {
    /// Append a trace message with the next dense `seq` and a
    /// non-decreasing `timestamp_ms`.
    fn push_message(&mut self, body: MessageBody) -> ProtocolMessage {
        let floor = self
            .session
            .messages
            .last()
            .map(|m| m.timestamp_ms)
            .unwrap_or(0);
        let message = ProtocolMessage {
            session: self.session.id,
            seq: self.session.messages.len() as u64,
            timestamp_ms: now_millis().max(floor),
            body,
        };
        self.session.messages.push(message.clone());
        message
    }
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<SessionId, SessionRecord>,
    /// (requester, course) pairs with a non-terminal session.
    active: HashMap<(RequesterId, CourseCode), SessionId>,
    next_id: u64,
}

/// Tracks in-flight negotiations keyed by session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session in `CFP_SENT`.
    ///
    /// Fails with [`Error::AlreadyNegotiating`] if a non-terminal session
    /// already exists for (requester, course). Terminal sessions never
    /// block reopening.
    pub async fn open(
        &self,
        requester: RequesterId,
        course: CourseCode,
        slot: Slot,
    ) -> Result<Session> {
        let mut inner = self.inner.write().await;

        let pair = (requester.clone(), course.clone());
        if inner.active.contains_key(&pair) {
            return Err(Error::AlreadyNegotiating { requester, course });
        }

        inner.next_id += 1;
        let id = SessionId(inner.next_id);
        let session = Session {
            id,
            requester,
            course,
            slot,
            state: SessionState::CfpSent,
            reason: None,
            created_at: now_millis(),
            messages: Vec::new(),
        };

        inner.active.insert(pair, id);
        inner.sessions.insert(
            id,
            SessionRecord {
                session: session.clone(),
                reservation: None,
            },
        );

        debug!(session = %id, requester = %session.requester, course = %session.course, "session opened");
        Ok(session)
    }

    /// Current snapshot of a session.
    pub async fn get(&self, id: SessionId) -> Result<Session> {
        self.inner
            .read()
            .await
            .sessions
            .get(&id)
            .map(|record| record.session.clone())
            .ok_or(Error::NotFound(id))
    }

    /// All sessions, ordered by id.
    pub async fn sessions(&self) -> Vec<Session> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<_> = inner
            .sessions
            .values()
            .map(|record| record.session.clone())
            .collect();
        sessions.sort_by_key(|session| session.id);
        sessions
    }

    /// Move a session to `next`, validating against the state table.
    ///
    /// Entering a terminal state removes the (requester, course) entry
    /// from the active index.
    pub async fn transition(&self, id: SessionId, next: SessionState) -> Result<Session> {
        let mut inner = self.inner.write().await;

        let snapshot = {
            let record = inner.sessions.get_mut(&id).ok_or(Error::NotFound(id))?;
            let current = record.session.state;
            if !current.can_transition(next) {
                return Err(Error::InvalidTransition {
                    session: id,
                    from: current,
                    to: next,
                });
            }
            record.session.state = next;
            record.session.clone()
        };

        if next.is_terminal() {
            inner
                .active
                .remove(&(snapshot.requester.clone(), snapshot.course.clone()));
        }

        debug!(session = %id, state = %next, "session transition");
        Ok(snapshot)
    }

    /// Append a trace message to a live session.
    ///
    /// `seq` is dense from 0 and `timestamp_ms` never decreases within
    /// the session. Terminal sessions reject appends.
    pub async fn append(&self, id: SessionId, body: MessageBody) -> Result<ProtocolMessage> {
        let mut inner = self.inner.write().await;
        let record = inner.sessions.get_mut(&id).ok_or(Error::NotFound(id))?;
        if record.session.state.is_terminal() {
            return Err(Error::SessionClosed(id));
        }
        Ok(record.push_message(body))
    }

    /// Close a session as `REFUSED` in one critical section: record the
    /// reason, append the REFUSE trace message, and take the session's
    /// held reservation so exactly one caller performs the ledger
    /// release.
    ///
    /// Returns the terminal snapshot, the REFUSE message, and the slot to
    /// release (if this session still held its reservation).
    pub async fn refuse(
        &self,
        id: SessionId,
        reason: RefusalReason,
    ) -> Result<(Session, ProtocolMessage, Option<Slot>)> {
        let mut inner = self.inner.write().await;

        let (snapshot, message, reservation) = {
            let record = inner.sessions.get_mut(&id).ok_or(Error::NotFound(id))?;
            if record.session.state.is_terminal() {
                return Err(Error::SessionClosed(id));
            }
            // Every non-terminal state may fall to Refused.
            let message = record.push_message(MessageBody::Refuse { reason });
            record.session.state = SessionState::Refused;
            record.session.reason = Some(reason);
            (record.session.clone(), message, record.reservation.take())
        };

        inner
            .active
            .remove(&(snapshot.requester.clone(), snapshot.course.clone()));

        debug!(session = %id, reason = %reason, "session refused");
        Ok((snapshot, message, reservation))
    }

    /// Record the ledger reservation this session holds.
    ///
    /// Fails with [`Error::SessionClosed`] if the session went terminal
    /// in the meantime - the caller then still owns the fresh ledger row
    /// and must roll it back itself.
    pub async fn note_reservation(&self, id: SessionId, slot: Slot) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner.sessions.get_mut(&id).ok_or(Error::NotFound(id))?;
        if record.session.state.is_terminal() {
            return Err(Error::SessionClosed(id));
        }
        record.reservation = Some(slot);
        Ok(())
    }

    /// Drop the reservation note without touching the ledger (the booking
    /// became authoritative at `CONFIRMED`).
    pub async fn clear_reservation(&self, id: SessionId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner.sessions.get_mut(&id).ok_or(Error::NotFound(id))?;
        record.reservation = None;
        Ok(())
    }

    /// Ids of non-terminal sessions created at or before `cutoff_ms`
    /// (input for the timeout reaper), ordered by id.
    pub async fn expired(&self, cutoff_ms: u64) -> Vec<SessionId> {
        let inner = self.inner.read().await;
        let mut ids: Vec<_> = inner
            .sessions
            .values()
            .filter(|record| {
                !record.session.state.is_terminal() && record.session.created_at <= cutoff_ms
            })
            .map(|record| record.session.id)
            .collect();
        ids.sort();
        ids
    }
}

/// Unix timestamp in milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

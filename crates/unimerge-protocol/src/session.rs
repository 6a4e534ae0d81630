//! Session lifecycle states and refusal reasons.
//!
//! The negotiation state machine:
//!
//! ```text
//! CFP_SENT ──► PROPOSED ──► ACCEPTED ──► CONFIRMED
//!     │            │            │
//!     └────────────┴────────────┴──────► REFUSED
//! ```
//!
//! `CONFIRMED` and `REFUSED` are terminal: once a session reaches either,
//! no further transition is permitted and the session never reopens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a negotiation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Call-for-proposals emitted; awaiting evaluation.
    CfpSent,
    /// The authority offered a slot.
    Proposed,
    /// The requester accepted the offer.
    Accepted,
    /// Booking finalized; terminal.
    Confirmed,
    /// Negotiation rejected; terminal.
    Refused,
}

impl SessionState {
    /// All states, success path first, failure terminal last.
    pub const ALL: [SessionState; 5] = [
        SessionState::CfpSent,
        SessionState::Proposed,
        SessionState::Accepted,
        SessionState::Confirmed,
        SessionState::Refused,
    ];

    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Refused)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Every non-terminal state may fall to `Refused`, so a timeout or
    /// abort can close a session wherever it has stalled.
    #[must_use]
    pub const fn can_transition(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::CfpSent, Self::Proposed | Self::Refused)
                | (Self::Proposed, Self::Accepted | Self::Refused)
                | (Self::Accepted, Self::Confirmed | Self::Refused)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CfpSent => f.write_str("CFP_SENT"),
            Self::Proposed => f.write_str("PROPOSED"),
            Self::Accepted => f.write_str("ACCEPTED"),
            Self::Confirmed => f.write_str("CONFIRMED"),
            Self::Refused => f.write_str("REFUSED"),
        }
    }
}

/// Why a negotiation ended `REFUSED`.
///
/// Serializes as a stable code (`DAY_PROHIBITED`, ...); [`fmt::Display`]
/// renders the human-readable reason recorded on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefusalReason {
    /// The preferred day is in the venue's prohibited-days set.
    DayProhibited,
    /// Another booking already holds the slot.
    SlotTaken,
    /// The negotiation stalled past the engine timeout.
    TimedOut,
    /// The requester declined the proposal.
    Declined,
    /// The session was aborted by an explicit request.
    Aborted,
}

impl RefusalReason {
    /// The stable machine-readable code, identical to the serde form.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DayProhibited => "DAY_PROHIBITED",
            Self::SlotTaken => "SLOT_TAKEN",
            Self::TimedOut => "TIMED_OUT",
            Self::Declined => "DECLINED",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayProhibited => f.write_str("day prohibited for venue"),
            Self::SlotTaken => f.write_str("slot already booked"),
            Self::TimedOut => f.write_str("negotiation timed out"),
            Self::Declined => f.write_str("proposal declined by requester"),
            Self::Aborted => f.write_str("negotiation aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_exact() {
        use SessionState::*;
        let allowed = [
            (CfpSent, Proposed),
            (CfpSent, Refused),
            (Proposed, Accepted),
            (Proposed, Refused),
            (Accepted, Confirmed),
            (Accepted, Refused),
        ];

        for from in SessionState::ALL {
            for to in SessionState::ALL {
                let expect = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expect,
                    "{from} -> {to} should be {expect}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_are_immutable() {
        for terminal in [SessionState::Confirmed, SessionState::Refused] {
            assert!(terminal.is_terminal());
            for to in SessionState::ALL {
                assert!(!terminal.can_transition(to), "{terminal} -> {to}");
            }
        }
        for live in [
            SessionState::CfpSent,
            SessionState::Proposed,
            SessionState::Accepted,
        ] {
            assert!(!live.is_terminal());
        }
    }

    #[test]
    fn state_display_matches_wire_form() {
        assert_eq!(SessionState::CfpSent.to_string(), "CFP_SENT");
        let json = serde_json::to_string(&SessionState::CfpSent).unwrap();
        assert_eq!(json, "\"CFP_SENT\"");
        for state in SessionState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn refusal_reason_texts() {
        assert_eq!(
            RefusalReason::DayProhibited.to_string(),
            "day prohibited for venue"
        );
        assert_eq!(RefusalReason::SlotTaken.to_string(), "slot already booked");
        assert_eq!(RefusalReason::TimedOut.to_string(), "negotiation timed out");
        assert_eq!(
            RefusalReason::Declined.to_string(),
            "proposal declined by requester"
        );
        assert_eq!(RefusalReason::Aborted.to_string(), "negotiation aborted");
    }

    #[test]
    fn refusal_reason_codes_round_trip() {
        for reason in [
            RefusalReason::DayProhibited,
            RefusalReason::SlotTaken,
            RefusalReason::TimedOut,
            RefusalReason::Declined,
            RefusalReason::Aborted,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
            let back: RefusalReason = serde_json::from_str(&json).unwrap();
            assert_eq!(back, reason);
        }
    }
}

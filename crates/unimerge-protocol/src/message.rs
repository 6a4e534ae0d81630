//! Protocol messages exchanged during a negotiation.
//!
//! A negotiation's observable trace is an ordered sequence of
//! [`ProtocolMessage`] records. The payload is internally tagged by
//! performative, so a serialized message reads like
//! `{"session":3,"seq":1,"timestampMs":...,"performative":"PROPOSE","slot":{...}}`.

use serde::{Deserialize, Serialize};

use crate::session::RefusalReason;
use crate::types::{CourseCode, Party, SessionId, Slot};

/// The contract-net message types, in the order they can appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performative {
    /// Call for proposals (requester → authority).
    #[serde(rename = "CFP")]
    Cfp,
    /// Slot offer (authority → requester).
    #[serde(rename = "PROPOSE")]
    Propose,
    /// Rejection with a reason (authority → requester). Terminal.
    #[serde(rename = "REFUSE")]
    Refuse,
    /// Proposal acceptance (requester → authority).
    #[serde(rename = "ACCEPT")]
    Accept,
    /// Final booking confirmation (authority → requester). Terminal.
    #[serde(rename = "INFORM")]
    Inform,
}

impl std::fmt::Display for Performative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cfp => f.write_str("CFP"),
            Self::Propose => f.write_str("PROPOSE"),
            Self::Refuse => f.write_str("REFUSE"),
            Self::Accept => f.write_str("ACCEPT"),
            Self::Inform => f.write_str("INFORM"),
        }
    }
}

/// Payload of a protocol message, tagged by performative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "performative")]
pub enum MessageBody {
    /// Requester solicits a proposal for a course at its preferred slot.
    #[serde(rename = "CFP")]
    Cfp { course: CourseCode, slot: Slot },
    /// Authority offers the slot it is prepared to book.
    #[serde(rename = "PROPOSE")]
    Propose { slot: Slot },
    /// Authority declines; the reason is recorded on the session.
    #[serde(rename = "REFUSE")]
    Refuse { reason: RefusalReason },
    /// Requester accepts the offered slot.
    #[serde(rename = "ACCEPT")]
    Accept { slot: Slot },
    /// Authority confirms the booking is final.
    #[serde(rename = "INFORM")]
    Inform { course: CourseCode, slot: Slot },
}

impl MessageBody {
    /// The performative this payload carries.
    #[must_use]
    pub const fn performative(&self) -> Performative {
        match self {
            Self::Cfp { .. } => Performative::Cfp,
            Self::Propose { .. } => Performative::Propose,
            Self::Refuse { .. } => Performative::Refuse,
            Self::Accept { .. } => Performative::Accept,
            Self::Inform { .. } => Performative::Inform,
        }
    }

    /// Which party emits this performative.
    #[must_use]
    pub const fn sender(&self) -> Party {
        match self {
            Self::Cfp { .. } | Self::Accept { .. } => Party::Requester,
            Self::Propose { .. } | Self::Refuse { .. } | Self::Inform { .. } => Party::Authority,
        }
    }
}

/// One record on a session's append-only trace.
///
/// `seq` is the emission index within the session (dense from 0) and
/// `timestamp_ms` is unix-epoch milliseconds, non-decreasing within a
/// session, so consumers can replay the exchange in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMessage {
    pub session: SessionId,
    pub seq: u64,
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Weekday;

    fn slot() -> Slot {
        Slot::new("LT1", Weekday::Monday).unwrap()
    }

    #[test]
    fn performative_display_matches_wire_form() {
        for (performative, expected) in [
            (Performative::Cfp, "CFP"),
            (Performative::Propose, "PROPOSE"),
            (Performative::Refuse, "REFUSE"),
            (Performative::Accept, "ACCEPT"),
            (Performative::Inform, "INFORM"),
        ] {
            assert_eq!(performative.to_string(), expected);
            let json = serde_json::to_string(&performative).unwrap();
            assert_eq!(json, format!("\"{expected}\""));
        }
    }

    #[test]
    fn sender_party_per_performative() {
        let course = CourseCode::new("CSC301").unwrap();
        let bodies = [
            (
                MessageBody::Cfp {
                    course: course.clone(),
                    slot: slot(),
                },
                Party::Requester,
            ),
            (MessageBody::Propose { slot: slot() }, Party::Authority),
            (
                MessageBody::Refuse {
                    reason: RefusalReason::SlotTaken,
                },
                Party::Authority,
            ),
            (MessageBody::Accept { slot: slot() }, Party::Requester),
            (
                MessageBody::Inform {
                    course,
                    slot: slot(),
                },
                Party::Authority,
            ),
        ];
        for (body, party) in bodies {
            assert_eq!(body.sender(), party, "{}", body.performative());
        }
    }

    #[test]
    fn message_serializes_with_flattened_tag() {
        let message = ProtocolMessage {
            session: SessionId(3),
            seq: 1,
            timestamp_ms: 1_700_000_000_000,
            body: MessageBody::Propose { slot: slot() },
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"session\":3"));
        assert!(json.contains("\"seq\":1"));
        assert!(json.contains("\"timestampMs\":1700000000000"));
        assert!(json.contains("\"performative\":\"PROPOSE\""));
        assert!(json.contains("\"venue\":\"LT1\""));

        let back: ProtocolMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn refuse_body_carries_reason_code() {
        let body = MessageBody::Refuse {
            reason: RefusalReason::DayProhibited,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"performative\":\"REFUSE\""));
        assert!(json.contains("\"reason\":\"DAY_PROHIBITED\""));
    }
}

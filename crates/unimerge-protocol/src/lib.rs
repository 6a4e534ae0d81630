//! UniMerge Protocol - Contract-Net Vocabulary for Exam Scheduling
//!
//! This crate defines the shared vocabulary for negotiating exam slot
//! bookings between a requesting agent (the student side) and the venue
//! authority: performatives, message bodies, session states with their
//! transition rules, refusal reasons, and the validated domain newtypes
//! they are built from.
//!
//! # Overview
//!
//! A negotiation is a short contract-net exchange over a single
//! [`Slot`] (a venue on a weekday):
//!
//! - **CFP** - the requester calls for a proposal for a course at a slot
//! - **PROPOSE / REFUSE** - the authority offers the slot or declines with
//!   a [`RefusalReason`]
//! - **ACCEPT** - the requester accepts the offer
//! - **INFORM** - the authority confirms the booking is final
//!
//! Every exchanged message is a [`ProtocolMessage`] carrying its session,
//! emission index, and timestamp, so observers can replay the exchange in
//! order. Session lifecycles are tracked with [`SessionState`], which owns
//! the legal transition table.
//!
//! This crate is pure data: no I/O, no async, no clocks.
//!
//! # Example
//!
//! ```rust
//! use unimerge_protocol::{CourseCode, SessionState, Slot, Weekday};
//!
//! let day: Weekday = "monday".parse()?;
//! let slot = Slot::new("LT-A", day)?;
//! let course = CourseCode::new("csc301")?;
//! assert_eq!(course.as_str(), "CSC301");
//! assert_eq!(slot.to_string(), "LT-A on Monday");
//!
//! // CFP_SENT can be answered, a confirmed session is immutable
//! assert!(SessionState::CfpSent.can_transition(SessionState::Proposed));
//! assert!(!SessionState::Confirmed.can_transition(SessionState::Refused));
//! # Ok::<(), unimerge_protocol::Error>(())
//! ```

pub mod error;
pub mod message;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use message::{MessageBody, Performative, ProtocolMessage};
pub use session::{RefusalReason, SessionState};
pub use types::{CourseCode, Identity, Party, RequesterId, Role, SessionId, Slot, Weekday};

//! UniMerge Knowledge - the negotiation authority's knowledge base.
//!
//! Two shared, mutable resources back every negotiation:
//!
//! - [`ConstraintStore`] - per-venue prohibited-day sets, replaced
//!   wholesale by the authority role and read live by the engine.
//! - [`BookingLedger`] - confirmed (venue, day) assignments with an
//!   atomic check-and-insert, guaranteeing at most one booking per slot.
//!
//! Both require atomic single-writer semantics per key; here each is a
//! `tokio::sync::RwLock` over a map, so a critical section is one lock
//! acquisition and contenders for the same key serialize on it. Neither
//! component is owned by any single session.

pub mod constraints;
pub mod error;
pub mod ledger;

pub use constraints::ConstraintStore;
pub use error::{Error, Result};
pub use ledger::{BookingLedger, BookingRecord};

//! The booking ledger: the authoritative record of confirmed slots.
//!
//! The ledger guarantees at most one booking per (venue, day) slot.
//! [`BookingLedger::try_reserve`] is the serialization point that makes
//! concurrent negotiations safe: the existence check and the insert
//! happen under a single write-lock acquisition, so of N contenders for
//! one slot exactly one wins and the rest observe [`Error::SlotTaken`].

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use unimerge_protocol::{CourseCode, RequesterId, Slot, Weekday};

use crate::error::{Error, Result};

/// A confirmed (or provisionally reserved) slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub venue: String,
    pub day: Weekday,
    pub course: CourseCode,
    pub requester: RequesterId,
    /// Unix-epoch milliseconds at reservation time.
    pub confirmed_at: u64,
}

impl BookingRecord {
    /// The slot this record occupies.
    pub fn slot(&self) -> Slot {
        Slot {
            venue: self.venue.clone(),
            day: self.day,
        }
    }
}

/// In-memory ledger of slot assignments, keyed by [`Slot`].
#[derive(Debug, Default)]
pub struct BookingLedger {
    records: RwLock<HashMap<Slot, BookingRecord>>,
}

impl BookingLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-insert a booking at `slot`.
    ///
    /// If the slot is free the record is inserted and returned; if it is
    /// already held, [`Error::SlotTaken`] is returned and nothing is
    /// mutated. The check and the insert share one critical section -
    /// this operation must not be preemptible by another request for the
    /// same slot.
    pub async fn try_reserve(
        &self,
        slot: &Slot,
        course: &CourseCode,
        requester: &RequesterId,
    ) -> Result<BookingRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(slot) {
            return Err(Error::SlotTaken(slot.clone()));
        }

        let record = BookingRecord {
            venue: slot.venue.clone(),
            day: slot.day,
            course: course.clone(),
            requester: requester.clone(),
            confirmed_at: now_millis(),
        };
        records.insert(slot.clone(), record.clone());
        debug!(slot = %slot, course = %course, "slot reserved");
        Ok(record)
    }

    /// Remove the record at `slot`, if any. Returns whether a record was
    /// removed. Idempotent: releasing a free slot is a no-op.
    ///
    /// Used to roll back the reservation of a session that failed after
    /// its `try_reserve` succeeded (timeout, decline, abort).
    pub async fn release(&self, slot: &Slot) -> bool {
        let removed = self.records.write().await.remove(slot).is_some();
        if removed {
            debug!(slot = %slot, "slot released");
        }
        removed
    }

    /// The record at `slot`, if booked.
    pub async fn booking(&self, slot: &Slot) -> Option<BookingRecord> {
        self.records.read().await.get(slot).cloned()
    }

    /// All records, sorted by (venue, day) for stable readback.
    pub async fn bookings(&self) -> Vec<BookingRecord> {
        let mut bookings: Vec<_> = self.records.read().await.values().cloned().collect();
        bookings.sort_by(|a, b| a.venue.cmp(&b.venue).then(a.day.cmp(&b.day)));
        bookings
    }

    /// Number of booked slots.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the ledger holds no bookings.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Unix timestamp in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

//! Per-venue prohibited-day constraints.
//!
//! One live constraint set exists per venue name. The authority replaces
//! a venue's set wholesale on each update (last-write-wins); readers
//! always observe either the old or the new set in full, never a partial
//! update. An unconfigured venue simply has the empty set - absence of
//! constraints is not an error.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::RwLock;
use tracing::debug;
use unimerge_protocol::Weekday;

/// The venue authority's standing constraints, keyed by venue name.
///
/// Venue names are matched exactly after trimming. Read-only to the
/// negotiation engine; mutated only through [`set_constraints`]
/// (authority role, enforced at the caller boundary).
///
/// [`set_constraints`]: ConstraintStore::set_constraints
#[derive(Debug, Default)]
pub struct ConstraintStore {
    venues: RwLock<HashMap<String, BTreeSet<Weekday>>>,
}

impl ConstraintStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the prohibited-day set for a venue.
    ///
    /// The replacement happens under one write-lock acquisition, so a
    /// concurrent reader sees the old set or the new set, nothing in
    /// between. Setting the empty set clears the venue's constraints.
    /// Idempotent: repeating the same call changes nothing.
    pub async fn set_constraints(&self, venue: &str, days: BTreeSet<Weekday>) {
        let venue = venue.trim().to_string();
        debug!(venue = %venue, prohibited = days.len(), "replacing venue constraints");
        self.venues.write().await.insert(venue, days);
    }

    /// The current prohibited-day set for a venue (empty if unknown).
    pub async fn constraints(&self, venue: &str) -> BTreeSet<Weekday> {
        self.venues
            .read()
            .await
            .get(venue.trim())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `day` is currently prohibited at `venue`.
    ///
    /// Reads the live snapshot; the engine calls this at evaluation time,
    /// never from a copy cached at session open.
    pub async fn is_prohibited(&self, venue: &str, day: Weekday) -> bool {
        self.venues
            .read()
            .await
            .get(venue.trim())
            .is_some_and(|days| days.contains(&day))
    }

    /// All configured venues with their prohibited-day sets, sorted by
    /// venue name (readback for the authority UI).
    pub async fn venues(&self) -> Vec<(String, BTreeSet<Weekday>)> {
        let mut venues: Vec<_> = self
            .venues
            .read()
            .await
            .iter()
            .map(|(venue, days)| (venue.clone(), days.clone()))
            .collect();
        venues.sort_by(|a, b| a.0.cmp(&b.0));
        venues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(days: &[Weekday]) -> BTreeSet<Weekday> {
        days.iter().copied().collect()
    }

    #[tokio::test]
    async fn unknown_venue_has_no_constraints() {
        let store = ConstraintStore::new();
        assert!(store.constraints("LT1").await.is_empty());
        assert!(!store.is_prohibited("LT1", Weekday::Monday).await);
    }

    #[tokio::test]
    async fn set_replaces_wholesale() {
        let store = ConstraintStore::new();

        store
            .set_constraints("LT1", days(&[Weekday::Monday, Weekday::Friday]))
            .await;
        assert!(store.is_prohibited("LT1", Weekday::Monday).await);
        assert!(store.is_prohibited("LT1", Weekday::Friday).await);

        // Replacement drops days absent from the new set.
        store.set_constraints("LT1", days(&[Weekday::Tuesday])).await;
        assert!(!store.is_prohibited("LT1", Weekday::Monday).await);
        assert!(store.is_prohibited("LT1", Weekday::Tuesday).await);
    }

    #[tokio::test]
    async fn empty_set_clears() {
        let store = ConstraintStore::new();
        store.set_constraints("LT1", days(&[Weekday::Monday])).await;
        store.set_constraints("LT1", BTreeSet::new()).await;

        assert!(store.constraints("LT1").await.is_empty());
        assert!(!store.is_prohibited("LT1", Weekday::Monday).await);
    }

    #[tokio::test]
    async fn set_is_idempotent() {
        let store = ConstraintStore::new();
        let prohibited = days(&[Weekday::Monday, Weekday::Wednesday]);

        store.set_constraints("LT1", prohibited.clone()).await;
        let first = store.venues().await;

        store.set_constraints("LT1", prohibited).await;
        let second = store.venues().await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn venue_names_are_trimmed() {
        let store = ConstraintStore::new();
        store
            .set_constraints(" LT1 ", days(&[Weekday::Monday]))
            .await;
        assert!(store.is_prohibited("LT1", Weekday::Monday).await);
        assert!(store.is_prohibited("  LT1", Weekday::Monday).await);
    }

    #[tokio::test]
    async fn venues_lists_sorted() {
        let store = ConstraintStore::new();
        store.set_constraints("LT2", days(&[Weekday::Monday])).await;
        store.set_constraints("LT1", BTreeSet::new()).await;

        let venues = store.venues().await;
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].0, "LT1");
        assert_eq!(venues[1].0, "LT2");
    }
}

//! Best-effort cache of the last rating the service reported.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use arenalink_protocol::{ParticipantId, Rating};

/// A cached rating and when we saw it (milliseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingEntry {
    pub rating: Rating,
    pub observed_at_millis: u64,
}

/// Last known rating per participant.
///
/// Every fresh response overwrites the entry. There is no eviction: the UI
/// asks the service again when a menu opens and shows the stale value until
/// the answer lands.
#[derive(Debug, Default)]
pub struct RatingCache {
    entries: HashMap<ParticipantId, RatingEntry>,
}

impl RatingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant: ParticipantId) -> Option<Rating> {
        self.entries.get(&participant).map(|e| e.rating)
    }

    pub fn entry(&self, participant: ParticipantId) -> Option<&RatingEntry> {
        self.entries.get(&participant)
    }

    /// Unconditional overwrite.
    pub fn set(&mut self, participant: ParticipantId, rating: Rating) {
        let observed_at_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        tracing::debug!(%participant, rating, "rating cached");
        self.entries.insert(
            participant,
            RatingEntry {
                rating,
                observed_at_millis,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unknown_participant_returns_none() {
        let cache = RatingCache::new();
        assert_eq!(cache.get(ParticipantId::new_v4()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_overwrites_previous_rating() {
        let mut cache = RatingCache::new();
        let p = ParticipantId::new_v4();

        cache.set(p, 1000);
        cache.set(p, 1032);

        assert_eq!(cache.get(p), Some(1032));
        assert_eq!(cache.len(), 1);
        assert!(cache.entry(p).is_some_and(|e| e.observed_at_millis > 0));
    }
}

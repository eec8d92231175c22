//! The queue tracker: who is waiting for a match.
//!
//! Local state is authoritative. An entry is created before the `queue`
//! message goes out and removed on dequeue whether or not the service ever
//! acknowledges it. The coordinator arms a timeout per entry; when it fires,
//! [`QueueTracker::check_timeout`] decides whether the entry it was armed
//! for is really stale.

use std::collections::HashMap;

use arenalink_protocol::{ParticipantId, QueueKind};
use tokio::time::Instant;

use crate::{QueueConfig, QueueEntry, QueueError};

/// Tracks every participant currently waiting in a queue.
///
/// ## Lifecycle
///
/// ```text
/// enqueue() ──→ [Queued] ──┬── dequeue()        (cancel, match found, left)
///                          ├── check_timeout()  (age ≥ timeout)
///                          └── clear()          (channel closed)
/// ```
#[derive(Debug)]
pub struct QueueTracker {
    /// At most one entry per participant.
    entries: HashMap<ParticipantId, QueueEntry>,

    /// The service's `queued` / `error` replies don't name a participant;
    /// they refer to whoever queued last.
    last_queued: Option<ParticipantId>,

    config: QueueConfig,
}

impl QueueTracker {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            entries: HashMap::new(),
            last_queued: None,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Records a new entry.
    ///
    /// Matched participants are rejected by the caller, which owns the
    /// match registry.
    ///
    /// # Errors
    /// Returns [`QueueError::AlreadyQueued`] if the participant already has
    /// an entry. The existing entry is left untouched.
    pub fn enqueue(
        &mut self,
        participant: ParticipantId,
        kind: QueueKind,
        now: Instant,
    ) -> Result<&QueueEntry, QueueError> {
        use std::collections::hash_map::Entry;

        match self.entries.entry(participant) {
            Entry::Occupied(_) => Err(QueueError::AlreadyQueued(participant)),
            Entry::Vacant(slot) => {
                self.last_queued = Some(participant);
                tracing::info!(%participant, %kind, "participant queued");
                Ok(slot.insert(QueueEntry {
                    participant,
                    kind,
                    enqueued_at: now,
                }))
            }
        }
    }

    /// Removes a participant's entry, returning it if there was one.
    pub fn dequeue(&mut self, participant: ParticipantId) -> Option<QueueEntry> {
        let removed = self.entries.remove(&participant);
        if removed.is_some() {
            tracing::info!(%participant, "participant dequeued");
        }
        removed
    }

    /// Evicts `participant` if, and only if, it is still queued and its
    /// entry has reached the timeout as of `now`.
    ///
    /// A timer armed for an earlier entry that was dequeued and re-queued
    /// finds a younger entry here and leaves it alone.
    pub fn check_timeout(&mut self, participant: ParticipantId, now: Instant) -> bool {
        let expired = self
            .entries
            .get(&participant)
            .is_some_and(|e| e.age(now) >= self.config.timeout);

        if expired {
            self.entries.remove(&participant);
            tracing::info!(%participant, "queue entry timed out");
        }
        expired
    }

    /// Drops every entry and returns who was evicted.
    pub fn clear(&mut self) -> Vec<ParticipantId> {
        self.last_queued = None;
        let evicted: Vec<_> = self.entries.drain().map(|(p, _)| p).collect();
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "queue cleared");
        }
        evicted
    }

    pub fn get(&self, participant: ParticipantId) -> Option<&QueueEntry> {
        self.entries.get(&participant)
    }

    pub fn is_queued(&self, participant: ParticipantId) -> bool {
        self.entries.contains_key(&participant)
    }

    pub fn kind_of(&self, participant: ParticipantId) -> Option<QueueKind> {
        self.entries.get(&participant).map(|e| e.kind)
    }

    /// The participant whose `queue` request went out last, if any.
    pub fn last_queued(&self) -> Option<ParticipantId> {
        self.last_queued
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn tracker() -> QueueTracker {
        QueueTracker::new(QueueConfig::default())
    }

    fn five_minutes() -> Duration {
        Duration::from_secs(300)
    }

    // =====================================================================
    // enqueue()
    // =====================================================================

    #[test]
    fn test_enqueue_new_participant_records_entry() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        let now = Instant::now();

        let entry = t.enqueue(p, QueueKind::Ranked, now).unwrap();

        assert_eq!(entry.participant, p);
        assert_eq!(entry.kind, QueueKind::Ranked);
        assert_eq!(entry.enqueued_at, now);
        assert_eq!(t.last_queued(), Some(p));
        assert_eq!(t.kind_of(p), Some(QueueKind::Ranked));
    }

    #[test]
    fn test_enqueue_twice_keeps_single_original_entry() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        let first = Instant::now();

        t.enqueue(p, QueueKind::Casual, first).unwrap();
        let err = t
            .enqueue(p, QueueKind::Ranked, first + Duration::from_secs(1))
            .unwrap_err();

        assert_eq!(err, QueueError::AlreadyQueued(p));
        assert_eq!(t.len(), 1);
        assert_eq!(t.kind_of(p), Some(QueueKind::Casual));
        assert_eq!(t.get(p).unwrap().enqueued_at, first);
    }

    // =====================================================================
    // dequeue()
    // =====================================================================

    #[test]
    fn test_dequeue_returns_entry_then_none() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        t.enqueue(p, QueueKind::Casual, Instant::now()).unwrap();

        assert!(t.dequeue(p).is_some());
        assert!(t.dequeue(p).is_none());
        assert!(!t.is_queued(p));
    }

    // =====================================================================
    // check_timeout()
    // =====================================================================

    #[test]
    fn test_check_timeout_evicts_stale_entry() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        let start = Instant::now();
        t.enqueue(p, QueueKind::Casual, start).unwrap();

        assert!(t.check_timeout(p, start + five_minutes()));
        assert!(!t.is_queued(p));
    }

    #[test]
    fn test_check_timeout_keeps_young_entry() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        let start = Instant::now();
        t.enqueue(p, QueueKind::Casual, start).unwrap();

        assert!(!t.check_timeout(p, start + five_minutes() - Duration::from_millis(1)));
        assert!(t.is_queued(p));
    }

    #[test]
    fn test_check_timeout_after_requeue_spares_new_entry() {
        let mut t = tracker();
        let p = ParticipantId::new_v4();
        let start = Instant::now();
        t.enqueue(p, QueueKind::Casual, start).unwrap();

        // Leave and come back two minutes later.
        t.dequeue(p);
        t.enqueue(p, QueueKind::Casual, start + Duration::from_secs(120))
            .unwrap();

        // The first entry's timer fires at start + 5 min.
        assert!(!t.check_timeout(p, start + five_minutes()));
        assert!(t.is_queued(p));
    }

    #[test]
    fn test_check_timeout_unknown_participant_is_noop() {
        let mut t = tracker();
        assert!(!t.check_timeout(ParticipantId::new_v4(), Instant::now()));
    }

    #[test]
    fn test_check_timeout_respects_configured_timeout() {
        let mut t = QueueTracker::new(QueueConfig {
            timeout: Duration::from_secs(10),
        });
        let p = ParticipantId::new_v4();
        let start = Instant::now();
        t.enqueue(p, QueueKind::Ranked, start).unwrap();

        assert!(t.check_timeout(p, start + Duration::from_secs(10)));
    }

    // =====================================================================
    // clear()
    // =====================================================================

    #[test]
    fn test_clear_returns_every_evicted_participant() {
        let mut t = tracker();
        let now = Instant::now();
        let ps: Vec<_> = (0..3).map(|_| ParticipantId::new_v4()).collect();
        for p in &ps {
            t.enqueue(*p, QueueKind::Ranked, now).unwrap();
        }

        let mut evicted = t.clear();
        evicted.sort();
        let mut expected = ps.clone();
        expected.sort();

        assert_eq!(evicted, expected);
        assert!(t.is_empty());
        assert_eq!(t.last_queued(), None);

        // Requeue works straight away.
        assert!(t.enqueue(ps[0], QueueKind::Ranked, now).is_ok());
    }
}

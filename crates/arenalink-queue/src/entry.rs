//! Queue entries and their configuration.

use std::time::Duration;

use arenalink_protocol::{ParticipantId, QueueKind};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Queue behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// How long an entry may wait before it is evicted locally.
    ///
    /// Default: 5 minutes.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
        }
    }
}

/// One participant waiting for a match.
///
/// `enqueued_at` uses Tokio's clock so paused-time tests can drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub participant: ParticipantId,
    pub kind: QueueKind,
    pub enqueued_at: Instant,
}

impl QueueEntry {
    /// How long the entry has been waiting as of `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

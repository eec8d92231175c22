//! Error types for the queue layer.

use arenalink_protocol::ParticipantId;

/// Reasons a queue operation is rejected.
///
/// All of these are decided locally, before anything goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The participant already has a queue entry.
    #[error("participant {0} is already queued")]
    AlreadyQueued(ParticipantId),

    /// The participant is playing a match and cannot queue.
    #[error("participant {0} is already in a match")]
    AlreadyMatched(ParticipantId),

    /// The participant has no queue entry to remove.
    #[error("participant {0} is not queued")]
    NotQueued(ParticipantId),
}

//! Unified error type for arenalink.

use arenalink_match::MatchError;
use arenalink_protocol::{ParticipantId, ProtocolError};
use arenalink_queue::QueueError;
use arenalink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Everything returned by [`CoordinatorHandle`](crate::CoordinatorHandle)
/// is one of these. The `#[from]` variants let `?` lift sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ArenalinkError {
    /// Channel to the matchmaking service (not connected, send failed).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding an outbound message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Rejected locally by the queue rules.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Match could not be created or driven.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The coordinator task has stopped.
    #[error("coordinator is unavailable")]
    Unavailable,

    #[error("participant {0} cannot challenge themselves")]
    CannotChallengeSelf(ParticipantId),

    /// The target already has a challenge waiting for an answer.
    #[error("participant {0} already has a pending challenge")]
    ChallengePending(ParticipantId),

    #[error("participant {0} has no pending challenge")]
    NoPendingChallenge(ParticipantId),
}

impl ArenalinkError {
    /// Returns `true` for the "send while the channel is closed" case.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::Transport(TransportError::NotConnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ArenalinkError = TransportError::NotConnected.into();
        assert!(err.is_not_connected());
        assert!(matches!(err, ArenalinkError::Transport(_)));
    }

    #[test]
    fn test_from_queue_error_is_transparent() {
        let p = ParticipantId::new_v4();
        let err: ArenalinkError = QueueError::AlreadyQueued(p).into();
        assert_eq!(err.to_string(), format!("participant {p} is already queued"));
        assert!(!err.is_not_connected());
    }

    #[test]
    fn test_from_match_error() {
        let p = ParticipantId::new_v4();
        let err: ArenalinkError = MatchError::ParticipantOffline(p).into();
        assert!(matches!(err, ArenalinkError::Match(MatchError::ParticipantOffline(_))));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ArenalinkError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, ArenalinkError::Protocol(_)));
    }
}

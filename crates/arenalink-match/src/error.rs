//! Error types for the match layer.

use arenalink_protocol::{MatchId, ParticipantId};

/// Errors that can occur while creating or driving a match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// An assignment named a participant who is already playing.
    /// Logged and dropped; the existing match is untouched.
    #[error("participant {0} is already in a match")]
    DuplicateAssignment(ParticipantId),

    /// A participant was not connected when the match tried to start.
    #[error("participant {0} is offline")]
    ParticipantOffline(ParticipantId),

    /// No arena could be provisioned.
    #[error("no arena available for match {0}")]
    ArenaUnavailable(MatchId),

    /// A match with this id is already registered.
    #[error("match {0} already exists")]
    AlreadyExists(MatchId),

    /// The match does not exist (or has already been removed).
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// A round-ending event arrived while no round was being fought.
    /// This is how duplicate eliminations and stale timers are discarded.
    #[error("no round in progress for match {0}")]
    RoundNotActive(MatchId),

    /// The participant does not play in this match.
    #[error("participant {0} is not in match {1}")]
    UnknownParticipant(ParticipantId, MatchId),

    /// Both slots name the same participant.
    #[error("participant {0} cannot play against themselves")]
    SameParticipant(ParticipantId),

    /// The match is in a phase that doesn't allow this operation.
    #[error("invalid match state for this operation: {0}")]
    InvalidState(String),
}

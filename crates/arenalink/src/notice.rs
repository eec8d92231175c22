//! Messages shown to participants.
//!
//! The coordinator never formats text itself; it hands a [`Notice`] to
//! [`World::notify`](crate::World::notify) and the host decides how to show
//! it. `Display` gives a plain-text default.

use std::fmt;

use arenalink_match::Outcome;
use arenalink_protocol::{MatchId, ParticipantId, QueueKind, Rating, RemoteErrorKind};

/// A score seen from one participant's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub yours: u32,
    pub theirs: u32,
}

impl Score {
    /// Reads `scores` (in participant order) from `slot`'s point of view.
    pub fn for_slot(scores: [u32; 2], slot: usize) -> Self {
        Self {
            yours: scores[slot],
            theirs: scores[1 - slot],
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.yours, self.theirs)
    }
}

/// Something a participant should be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    // --- queue ---------------------------------------------------------
    /// Local queue entry created and request sent.
    Queued { kind: QueueKind },
    /// The service acknowledged the queue request.
    QueueConfirmed { kind: QueueKind, rating: Option<Rating> },
    QueueLeft,
    /// The service dropped the participant from its queue.
    QueueCancelled { message: String },
    QueueTimedOut,
    AlreadyQueued,
    AlreadyInMatch,
    NotQueued,
    NotConnected,
    /// The channel closed and the participant's queue entry went with it.
    Disconnected,
    RemoteError(RemoteErrorKind),

    // --- matches -------------------------------------------------------
    /// A match could not start because the opponent is offline.
    OpponentOffline,
    ArenaUnavailable,
    MatchStarting {
        match_id: MatchId,
        opponent: ParticipantId,
        kind: QueueKind,
    },
    RoundStarted { round: u32, score: Score },
    RoundEnded {
        round: u32,
        outcome: Outcome,
        score: Score,
    },
    MatchEnded { outcome: Outcome, score: Score },
    /// The ranked result could not be sent; the rating may not change.
    ResultNotSubmitted,
    RatingUpdated { rating: Rating },

    // --- challenges ----------------------------------------------------
    ChallengeSent { target: ParticipantId },
    ChallengeReceived { challenger: ParticipantId },
    /// Sent to the challenger.
    ChallengeDenied { target: ParticipantId },
    /// Sent to the target who turned it down.
    ChallengeDeclined { challenger: ParticipantId },
    ChallengeExpired { other: ParticipantId },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued { kind } => {
                write!(f, "You have been added to the {kind} matchmaking queue!")
            }
            Self::QueueConfirmed { rating: Some(r), .. } => {
                write!(f, "Queue confirmed! Searching for opponents... Your rating: {r}")
            }
            Self::QueueConfirmed { rating: None, .. } => {
                f.write_str("Queue confirmed! Searching for opponents...")
            }
            Self::QueueLeft => f.write_str("You have been removed from the matchmaking queue!"),
            Self::QueueCancelled { message } => f.write_str(message),
            Self::QueueTimedOut => {
                f.write_str("You have been removed from the queue after waiting too long.")
            }
            Self::AlreadyQueued => f.write_str("You are already in a queue."),
            Self::AlreadyInMatch => f.write_str("You are already in a match."),
            Self::NotQueued => f.write_str("You are not in a queue."),
            Self::NotConnected => {
                f.write_str("Matchmaking server is not connected. Please try again shortly.")
            }
            Self::Disconnected => f.write_str(
                "Matchmaking server disconnected. You have been removed from any active queues.",
            ),
            Self::RemoteError(kind) => write!(f, "{kind}"),
            Self::OpponentOffline => f.write_str(
                "Match failed: your opponent is no longer online. You have been removed from the queue.",
            ),
            Self::ArenaUnavailable => f.write_str("Match failed: no arena could be created."),
            Self::MatchStarting { kind, .. } => write!(f, "{kind} match found!"),
            Self::RoundStarted { round, score } => {
                write!(f, "Round {round}. Score: {score}")
            }
            Self::RoundEnded {
                round,
                outcome,
                score,
            } => {
                let verdict = match outcome {
                    Outcome::Win => "you won",
                    Outcome::Loss => "you lost",
                    Outcome::Draw => "draw",
                };
                write!(f, "Round {round} ended, {verdict}. Score: {score}")
            }
            Self::MatchEnded { outcome, score } => {
                let verdict = match outcome {
                    Outcome::Win => "YOU WIN!",
                    Outcome::Loss => "YOU LOSE!",
                    Outcome::Draw => "DRAW!",
                };
                write!(f, "Match ended. Final score: {score}. {verdict}")
            }
            Self::ResultNotSubmitted => f.write_str(
                "Failed to submit match results. Your rating may not have been updated.",
            ),
            Self::RatingUpdated { rating } => write!(f, "Your new rating: {rating}"),
            Self::ChallengeSent { target } => write!(f, "Challenge sent to {target}."),
            Self::ChallengeReceived { challenger } => {
                write!(f, "{challenger} has challenged you to a duel!")
            }
            Self::ChallengeDenied { target } => write!(f, "{target} denied your challenge."),
            Self::ChallengeDeclined { challenger } => {
                write!(f, "You denied the challenge from {challenger}.")
            }
            Self::ChallengeExpired { other } => write!(f, "Challenge with {other} expired."),
        }
    }
}

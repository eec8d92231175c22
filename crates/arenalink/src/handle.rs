//! The public face of the coordinator: a cloneable handle that turns method
//! calls into commands.

use arenalink_match::MatchSnapshot;
use arenalink_protocol::{MatchId, ParticipantId, QueueKind, Rating};
use tokio::sync::{mpsc, oneshot};

use crate::ArenalinkError;

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the coordinator through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel.
pub(crate) enum Command {
    Enqueue {
        participant: ParticipantId,
        kind: QueueKind,
        reply: Reply<Result<(), ArenalinkError>>,
    },
    Dequeue {
        participant: ParticipantId,
        reply: Reply<bool>,
    },
    RequestRating {
        participant: ParticipantId,
        reply: Reply<Result<(), ArenalinkError>>,
    },
    Rating {
        participant: ParticipantId,
        reply: Reply<Option<Rating>>,
    },
    IsInMatch {
        participant: ParticipantId,
        reply: Reply<bool>,
    },
    IsQueued {
        participant: ParticipantId,
        reply: Reply<bool>,
    },
    IsConnected {
        reply: Reply<bool>,
    },
    MatchSnapshot {
        participant: ParticipantId,
        reply: Reply<Option<MatchSnapshot>>,
    },
    Eliminated {
        participant: ParticipantId,
        reply: Reply<bool>,
    },
    Joined {
        participant: ParticipantId,
    },
    Left {
        participant: ParticipantId,
    },
    Challenge {
        challenger: ParticipantId,
        target: ParticipantId,
        reply: Reply<Result<(), ArenalinkError>>,
    },
    AcceptChallenge {
        target: ParticipantId,
        reply: Reply<Result<MatchId, ArenalinkError>>,
    },
    DenyChallenge {
        target: ParticipantId,
        reply: Reply<Result<(), ArenalinkError>>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Handle to a running coordinator. Cheap to clone.
///
/// Every method is a round trip through the coordinator task, so answers
/// always reflect every event processed before the call.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub(crate) fn new(sender: mpsc::Sender<Command>) -> Self {
        Self { sender }
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, ArenalinkError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| ArenalinkError::Unavailable)?;
        reply_rx.await.map_err(|_| ArenalinkError::Unavailable)
    }

    async fn tell(&self, command: Command) -> Result<(), ArenalinkError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ArenalinkError::Unavailable)
    }

    // -----------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------

    /// Puts a participant in a queue.
    ///
    /// # Errors
    /// `AlreadyMatched`, `AlreadyQueued` or `NotConnected`; the participant
    /// has already been told why.
    pub async fn enqueue(
        &self,
        participant: ParticipantId,
        kind: QueueKind,
    ) -> Result<(), ArenalinkError> {
        self.call(|reply| Command::Enqueue {
            participant,
            kind,
            reply,
        })
        .await?
    }

    /// Takes a participant out of the queue. Returns `false` if they weren't
    /// queued.
    pub async fn dequeue(&self, participant: ParticipantId) -> Result<bool, ArenalinkError> {
        self.call(|reply| Command::Dequeue { participant, reply })
            .await
    }

    pub async fn is_queued(&self, participant: ParticipantId) -> Result<bool, ArenalinkError> {
        self.call(|reply| Command::IsQueued { participant, reply })
            .await
    }

    // -----------------------------------------------------------------
    // Ratings
    // -----------------------------------------------------------------

    /// Asks the service for a fresh rating. The answer lands in the cache.
    pub async fn request_rating(&self, participant: ParticipantId) -> Result<(), ArenalinkError> {
        self.call(|reply| Command::RequestRating { participant, reply })
            .await?
    }

    /// Last known rating, possibly stale.
    pub async fn rating(&self, participant: ParticipantId) -> Result<Option<Rating>, ArenalinkError> {
        self.call(|reply| Command::Rating { participant, reply })
            .await
    }

    // -----------------------------------------------------------------
    // Matches
    // -----------------------------------------------------------------

    pub async fn is_in_match(&self, participant: ParticipantId) -> Result<bool, ArenalinkError> {
        self.call(|reply| Command::IsInMatch { participant, reply })
            .await
    }

    pub async fn match_snapshot(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<MatchSnapshot>, ArenalinkError> {
        self.call(|reply| Command::MatchSnapshot { participant, reply })
            .await
    }

    /// Reports that a participant was knocked out. Returns `true` if this
    /// ended a round, `false` if it was ignored (not in a match, or the
    /// round was already decided).
    pub async fn participant_eliminated(
        &self,
        participant: ParticipantId,
    ) -> Result<bool, ArenalinkError> {
        self.call(|reply| Command::Eliminated { participant, reply })
            .await
    }

    // -----------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------

    pub async fn participant_joined(&self, participant: ParticipantId) -> Result<(), ArenalinkError> {
        self.tell(Command::Joined { participant }).await
    }

    pub async fn participant_left(&self, participant: ParticipantId) -> Result<(), ArenalinkError> {
        self.tell(Command::Left { participant }).await
    }

    // -----------------------------------------------------------------
    // Challenges
    // -----------------------------------------------------------------

    pub async fn challenge(
        &self,
        challenger: ParticipantId,
        target: ParticipantId,
    ) -> Result<(), ArenalinkError> {
        self.call(|reply| Command::Challenge {
            challenger,
            target,
            reply,
        })
        .await?
    }

    /// Accepts the challenge waiting for `target` and starts the duel.
    pub async fn accept_challenge(&self, target: ParticipantId) -> Result<MatchId, ArenalinkError> {
        self.call(|reply| Command::AcceptChallenge { target, reply })
            .await?
    }

    pub async fn deny_challenge(&self, target: ParticipantId) -> Result<(), ArenalinkError> {
        self.call(|reply| Command::DenyChallenge { target, reply })
            .await?
    }

    // -----------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------

    pub async fn is_connected(&self) -> Result<bool, ArenalinkError> {
        self.call(|reply| Command::IsConnected { reply }).await
    }

    /// Stops the coordinator. Queued participants are dropped and the
    /// channel is closed; returns once that is done.
    pub async fn shutdown(&self) -> Result<(), ArenalinkError> {
        self.call(|reply| Command::Shutdown { reply }).await
    }
}

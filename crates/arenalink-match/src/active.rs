//! One match between two participants and its round state machine.

use std::collections::HashMap;
use std::fmt;

use arenalink_protocol::{MatchId, ParticipantId, QueueKind};
use serde::{Deserialize, Serialize};

use crate::{MatchError, MatchPhase};

// ---------------------------------------------------------------------------
// Collaborator values
// ---------------------------------------------------------------------------

/// A location in the game world, as handed over by the world collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

/// Opaque reference to a provisioned arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaHandle(pub String);

impl fmt::Display for ArenaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Round results
// ---------------------------------------------------------------------------

/// What ended a round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundEndTrigger {
    /// A participant was knocked out; the other one takes the round.
    Elimination { eliminated: ParticipantId },
    /// The round timer ran out. Health is given in participant order;
    /// strictly higher health wins, equal health is a draw.
    Timeout { health: [f64; 2] },
}

/// The result of one round, returned by [`ActiveMatch::end_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: u32,
    /// `None` for a draw.
    pub winner: Option<ParticipantId>,
    /// Set when the round ended by elimination.
    pub eliminated: Option<ParticipantId>,
    /// Scores after this round, in participant order.
    pub scores: [u32; 2],
    /// `true` if this round decided the match.
    pub match_over: bool,
}

/// How a match went for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Final, immutable outcome of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub match_id: MatchId,
    /// In originally assigned order (player 1, player 2).
    pub participants: [ParticipantId; 2],
    pub kind: QueueKind,
    /// Rounds won, same order as `participants`.
    pub rounds: [u32; 2],
}

impl MatchResult {
    pub fn winner(&self) -> Option<ParticipantId> {
        match self.rounds[0].cmp(&self.rounds[1]) {
            std::cmp::Ordering::Greater => Some(self.participants[0]),
            std::cmp::Ordering::Less => Some(self.participants[1]),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// `None` if `participant` didn't play in this match.
    pub fn outcome_for(&self, participant: ParticipantId) -> Option<Outcome> {
        if !self.participants.contains(&participant) {
            return None;
        }
        Some(match self.winner() {
            None => Outcome::Draw,
            Some(w) if w == participant => Outcome::Win,
            Some(_) => Outcome::Loss,
        })
    }
}

/// Read-only view of a match for UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub participants: [ParticipantId; 2],
    pub kind: QueueKind,
    pub round: u32,
    pub scores: [u32; 2],
    pub phase: MatchPhase,
}

// ---------------------------------------------------------------------------
// ActiveMatch
// ---------------------------------------------------------------------------

/// State of one running match.
///
/// The registry owns it; callers only ever hold a reference taken from
/// the registry, never a copy.
#[derive(Debug)]
pub struct ActiveMatch {
    id: MatchId,
    participants: [ParticipantId; 2],
    kind: QueueKind,
    arena: ArenaHandle,
    scores: [u32; 2],
    /// 0 until the first round starts, then only ever increases.
    round: u32,
    phase: MatchPhase,
    rounds_to_win: u32,
    /// Where each participant stood before the match.
    origins: HashMap<ParticipantId, Position>,
}

impl ActiveMatch {
    /// # Errors
    /// Returns [`MatchError::SameParticipant`] if both slots are the same
    /// participant.
    pub fn new(
        id: MatchId,
        participants: [ParticipantId; 2],
        kind: QueueKind,
        arena: ArenaHandle,
        rounds_to_win: u32,
    ) -> Result<Self, MatchError> {
        if participants[0] == participants[1] {
            return Err(MatchError::SameParticipant(participants[0]));
        }
        Ok(Self {
            id,
            participants,
            kind,
            arena,
            scores: [0, 0],
            round: 0,
            phase: MatchPhase::Starting,
            rounds_to_win: rounds_to_win.max(1),
            origins: HashMap::new(),
        })
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn participants(&self) -> [ParticipantId; 2] {
        self.participants
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn arena(&self) -> &ArenaHandle {
        &self.arena
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// 0 for player 1, 1 for player 2.
    pub fn slot_of(&self, participant: ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| *p == participant)
    }

    pub fn opponent_of(&self, participant: ParticipantId) -> Option<ParticipantId> {
        self.slot_of(participant).map(|slot| self.participants[1 - slot])
    }

    pub fn score_of(&self, participant: ParticipantId) -> Option<u32> {
        self.slot_of(participant).map(|slot| self.scores[slot])
    }

    pub fn set_origin(&mut self, participant: ParticipantId, position: Position) {
        self.origins.insert(participant, position);
    }

    pub fn origin(&self, participant: ParticipantId) -> Option<&Position> {
        self.origins.get(&participant)
    }

    /// Hands the stored origins to whoever cleans up after the match.
    pub fn take_origins(&mut self) -> HashMap<ParticipantId, Position> {
        std::mem::take(&mut self.origins)
    }

    /// Starts the next round and returns its number.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidState`] unless the match is `Starting`
    /// or between rounds.
    pub fn begin_round(&mut self) -> Result<u32, MatchError> {
        if !self.phase.can_begin_round() {
            return Err(MatchError::InvalidState(format!(
                "match {} cannot start a round while {}",
                self.id, self.phase
            )));
        }
        self.round += 1;
        self.phase = MatchPhase::RoundActive { round: self.round };
        tracing::debug!(match_id = %self.id, round = self.round, "round started");
        Ok(self.round)
    }

    /// Decides the current round.
    ///
    /// Only the first trigger for a round is accepted; it moves the match
    /// out of `RoundActive` so any later trigger gets
    /// [`MatchError::RoundNotActive`] and changes nothing.
    ///
    /// # Errors
    /// - [`MatchError::RoundNotActive`]: no round is being fought
    /// - [`MatchError::UnknownParticipant`]: the eliminated participant
    ///   isn't in this match
    pub fn end_round(&mut self, trigger: RoundEndTrigger) -> Result<RoundOutcome, MatchError> {
        let MatchPhase::RoundActive { round } = self.phase else {
            return Err(MatchError::RoundNotActive(self.id.clone()));
        };

        let (winner_slot, eliminated) = match trigger {
            RoundEndTrigger::Elimination { eliminated } => {
                let slot = self
                    .slot_of(eliminated)
                    .ok_or_else(|| MatchError::UnknownParticipant(eliminated, self.id.clone()))?;
                (Some(1 - slot), Some(eliminated))
            }
            RoundEndTrigger::Timeout { health } => {
                let slot = if health[0] > health[1] {
                    Some(0)
                } else if health[1] > health[0] {
                    Some(1)
                } else {
                    None
                };
                (slot, None)
            }
        };

        if let Some(slot) = winner_slot {
            self.scores[slot] += 1;
        }

        let match_over = self.scores.iter().any(|s| *s >= self.rounds_to_win);
        self.phase = if match_over {
            MatchPhase::MatchEnding
        } else {
            MatchPhase::RoundEnding { round }
        };

        let winner = winner_slot.map(|slot| self.participants[slot]);
        tracing::info!(
            match_id = %self.id,
            round,
            winner = ?winner,
            score = ?self.scores,
            match_over,
            "round ended"
        );

        Ok(RoundOutcome {
            round,
            winner,
            eliminated,
            scores: self.scores,
            match_over,
        })
    }

    /// Closes a decided match and produces its result.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidState`] unless the match is in
    /// `MatchEnding`.
    pub fn finish(&mut self) -> Result<MatchResult, MatchError> {
        if self.phase != MatchPhase::MatchEnding {
            return Err(MatchError::InvalidState(format!(
                "match {} cannot finish while {}",
                self.id, self.phase
            )));
        }
        self.phase = MatchPhase::Ended;
        Ok(MatchResult {
            match_id: self.id.clone(),
            participants: self.participants,
            kind: self.kind,
            rounds: self.scores,
        })
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id.clone(),
            participants: self.participants,
            kind: self.kind,
            round: self.round,
            scores: self.scores,
            phase: self.phase,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_match() -> (ActiveMatch, ParticipantId, ParticipantId) {
        let a = ParticipantId::new_v4();
        let b = ParticipantId::new_v4();
        let m = ActiveMatch::new(
            MatchId::from("m-1"),
            [a, b],
            QueueKind::Ranked,
            ArenaHandle("arena-1".into()),
            3,
        )
        .unwrap();
        (m, a, b)
    }

    #[test]
    fn test_new_match_starts_at_zero() {
        let (m, a, b) = new_match();
        assert_eq!(m.phase(), MatchPhase::Starting);
        assert_eq!(m.round(), 0);
        assert_eq!(m.score_of(a), Some(0));
        assert_eq!(m.score_of(b), Some(0));
        assert_eq!(m.opponent_of(a), Some(b));
    }

    #[test]
    fn test_new_match_same_participant_rejected() {
        let a = ParticipantId::new_v4();
        let err = ActiveMatch::new(
            MatchId::from("m"),
            [a, a],
            QueueKind::Casual,
            ArenaHandle("x".into()),
            3,
        )
        .unwrap_err();
        assert_eq!(err, MatchError::SameParticipant(a));
    }

    #[test]
    fn test_begin_round_twice_without_ending_rejected() {
        let (mut m, _, _) = new_match();
        assert_eq!(m.begin_round().unwrap(), 1);
        assert!(matches!(m.begin_round(), Err(MatchError::InvalidState(_))));
        assert_eq!(m.round(), 1);
    }

    #[test]
    fn test_end_round_elimination_awards_survivor() {
        let (mut m, a, b) = new_match();
        m.begin_round().unwrap();

        let outcome = m
            .end_round(RoundEndTrigger::Elimination { eliminated: a })
            .unwrap();

        assert_eq!(outcome.winner, Some(b));
        assert_eq!(outcome.eliminated, Some(a));
        assert_eq!(outcome.scores, [0, 1]);
        assert!(!outcome.match_over);
        assert_eq!(m.phase(), MatchPhase::RoundEnding { round: 1 });
    }

    #[test]
    fn test_end_round_second_trigger_is_rejected_and_scores_once() {
        let (mut m, a, b) = new_match();
        m.begin_round().unwrap();

        m.end_round(RoundEndTrigger::Elimination { eliminated: a })
            .unwrap();
        let err = m
            .end_round(RoundEndTrigger::Elimination { eliminated: a })
            .unwrap_err();
        assert_eq!(err, MatchError::RoundNotActive(MatchId::from("m-1")));

        let err = m
            .end_round(RoundEndTrigger::Timeout { health: [20.0, 1.0] })
            .unwrap_err();
        assert!(matches!(err, MatchError::RoundNotActive(_)));

        assert_eq!(m.score_of(b), Some(1));
        assert_eq!(m.score_of(a), Some(0));
    }

    #[test]
    fn test_end_round_before_first_round_rejected() {
        let (mut m, a, _) = new_match();
        assert!(matches!(
            m.end_round(RoundEndTrigger::Elimination { eliminated: a }),
            Err(MatchError::RoundNotActive(_))
        ));
    }

    #[test]
    fn test_end_round_unknown_participant_leaves_round_running() {
        let (mut m, _, _) = new_match();
        m.begin_round().unwrap();
        let stranger = ParticipantId::new_v4();

        let err = m
            .end_round(RoundEndTrigger::Elimination { eliminated: stranger })
            .unwrap_err();

        assert!(matches!(err, MatchError::UnknownParticipant(p, _) if p == stranger));
        assert!(m.phase().is_round_active());
    }

    #[test]
    fn test_end_round_timeout_higher_health_wins() {
        let (mut m, a, _) = new_match();
        m.begin_round().unwrap();

        let outcome = m
            .end_round(RoundEndTrigger::Timeout { health: [14.5, 3.0] })
            .unwrap();

        assert_eq!(outcome.winner, Some(a));
        assert_eq!(outcome.eliminated, None);
        assert_eq!(outcome.scores, [1, 0]);
    }

    #[test]
    fn test_end_round_timeout_equal_health_is_draw_and_round_advances() {
        let (mut m, _, _) = new_match();
        m.begin_round().unwrap();

        let outcome = m
            .end_round(RoundEndTrigger::Timeout { health: [10.0, 10.0] })
            .unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.scores, [0, 0]);

        assert_eq!(m.begin_round().unwrap(), 2);
    }

    #[test]
    fn test_third_round_win_ends_match() {
        let (mut m, a, b) = new_match();
        for _ in 0..2 {
            m.begin_round().unwrap();
            m.end_round(RoundEndTrigger::Elimination { eliminated: a })
                .unwrap();
        }
        m.begin_round().unwrap();
        let outcome = m
            .end_round(RoundEndTrigger::Elimination { eliminated: a })
            .unwrap();

        assert!(outcome.match_over);
        assert_eq!(m.phase(), MatchPhase::MatchEnding);
        assert!(m.begin_round().is_err());

        let result = m.finish().unwrap();
        assert_eq!(result.rounds, [0, 3]);
        assert_eq!(result.winner(), Some(b));
        assert_eq!(result.outcome_for(a), Some(Outcome::Loss));
        assert_eq!(result.outcome_for(b), Some(Outcome::Win));
        assert_eq!(m.phase(), MatchPhase::Ended);
    }

    #[test]
    fn test_finish_mid_match_rejected() {
        let (mut m, _, _) = new_match();
        m.begin_round().unwrap();
        assert!(matches!(m.finish(), Err(MatchError::InvalidState(_))));
    }

    #[test]
    fn test_origins_are_taken_once() {
        let (mut m, a, _) = new_match();
        let pos = Position {
            world: "lobby".into(),
            x: 1.0,
            y: 64.0,
            z: -3.0,
            yaw: 90.0,
            pitch: 0.0,
        };
        m.set_origin(a, pos.clone());
        assert_eq!(m.origin(a), Some(&pos));

        let origins = m.take_origins();
        assert_eq!(origins.get(&a), Some(&pos));
        assert!(m.origin(a).is_none());
    }

    #[test]
    fn test_result_outcome_for_stranger_is_none() {
        let (m, _, _) = new_match();
        let result = MatchResult {
            match_id: m.id().clone(),
            participants: m.participants(),
            kind: m.kind(),
            rounds: [1, 1],
        };
        assert_eq!(result.winner(), None);
        assert_eq!(result.outcome_for(ParticipantId::new_v4()), None);
        assert_eq!(result.outcome_for(m.participants()[0]), Some(Outcome::Draw));
    }
}

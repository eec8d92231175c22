//! Driving matches: start, rounds, end and cleanup.
//!
//! The phase checks live on [`ActiveMatch`]; this file wires them to the
//! world and the timer wheel. Ordering rules:
//!
//! - starting a round cancels any round timer still armed for the match
//! - ending a round cancels its timer before anything else is scheduled
//! - a finished match leaves the registry before its result is announced
//!   or its cleanup is scheduled

use arenalink_match::{
    ActiveMatch, MatchError, MatchPhase, Position, RoundEndTrigger,
};
use arenalink_protocol::{Codec, MatchId, ParticipantId, QueueKind};
use arenalink_timer::TimerId;
use arenalink_transport::Connector;

use crate::coordinator::{CleanupJob, Coordinator, TimerEvent};
use crate::notice::Score;
use crate::{Notice, World, report};

impl<K: Connector, W: World, C: Codec> Coordinator<K, W, C> {
    /// STARTING: provisions the arena, records where everyone stood,
    /// equips loadouts and starts round 1.
    ///
    /// # Errors
    /// - [`MatchError::DuplicateAssignment`]: someone is already playing
    /// - [`MatchError::ArenaUnavailable`]: both participants were told
    pub(crate) fn start_match(
        &mut self,
        match_id: MatchId,
        participants: [ParticipantId; 2],
        kind: QueueKind,
    ) -> Result<(), MatchError> {
        for p in participants {
            if self.matches.contains_participant(p) {
                return Err(MatchError::DuplicateAssignment(p));
            }
        }
        for p in participants {
            self.drop_from_queue(p);
        }

        let Some(arena) = self.world.create_arena(kind) else {
            tracing::error!(%match_id, "no arena available");
            for p in participants {
                self.world.notify(p, &Notice::ArenaUnavailable);
            }
            return Err(MatchError::ArenaUnavailable(match_id));
        };

        let active = match ActiveMatch::new(
            match_id.clone(),
            participants,
            kind,
            arena.clone(),
            self.config.matches.rounds_to_win,
        ) {
            Ok(active) => active,
            Err(e) => {
                self.world.release_arena(arena);
                return Err(e);
            }
        };
        let active = match self.matches.insert(active) {
            Ok(active) => active,
            Err(e) => {
                self.world.release_arena(arena);
                return Err(e);
            }
        };

        for p in participants {
            if let Some(origin) = self.world.position(p) {
                active.set_origin(p, origin);
            }
            self.world.apply_loadout(p, kind);
        }

        tracing::info!(%match_id, %kind, %arena, "match started");
        for (slot, p) in participants.into_iter().enumerate() {
            self.world.notify(
                p,
                &Notice::MatchStarting {
                    match_id: match_id.clone(),
                    opponent: participants[1 - slot],
                    kind,
                },
            );
        }

        self.start_round(&match_id);
        Ok(())
    }

    /// ROUND_IN_PROGRESS: resets both participants, puts them on their
    /// spawn slots and arms the round timer.
    pub(crate) fn start_round(&mut self, match_id: &MatchId) {
        let Some(active) = self.matches.get_mut(match_id) else {
            tracing::debug!(%match_id, "next round for a match that is gone");
            return;
        };
        let round = match active.begin_round() {
            Ok(round) => round,
            Err(e) => {
                tracing::debug!(%match_id, error = %e, "round not started");
                return;
            }
        };
        let participants = active.participants();
        let kind = active.kind();
        let scores = active.scores();
        let arena = active.arena().clone();

        for (slot, p) in participants.into_iter().enumerate() {
            self.world.reset_vitals(p);
            self.world.apply_loadout(p, kind);
            self.world.teleport_to_slot(&arena, slot, p);
            self.world.notify(
                p,
                &Notice::RoundStarted {
                    round,
                    score: Score::for_slot(scores, slot),
                },
            );
        }

        if let Some(old) = self.round_timers.remove(match_id) {
            self.timers.cancel(old);
        }
        let timer = self.timers.schedule(
            self.config.matches.round_timeout,
            TimerEvent::RoundTimeout {
                match_id: match_id.clone(),
                round,
            },
        );
        self.round_timers.insert(match_id.clone(), timer);
    }

    /// An elimination reported by the world. Returns `true` if it decided
    /// the round.
    pub(crate) fn participant_eliminated(&mut self, participant: ParticipantId) -> bool {
        let Some(match_id) = self.matches.match_of(participant).cloned() else {
            return false;
        };
        self.end_round(
            &match_id,
            RoundEndTrigger::Elimination {
                eliminated: participant,
            },
        )
    }

    pub(crate) fn on_round_timeout(&mut self, timer: TimerId, match_id: &MatchId, round: u32) {
        if self.round_timers.get(match_id) == Some(&timer) {
            self.round_timers.remove(match_id);
        }
        let Some(active) = self.matches.get(match_id) else {
            return;
        };
        if active.phase() != (MatchPhase::RoundActive { round }) {
            return;
        }

        // Offline participants count as having no health left.
        let health = active.participants().map(|p| {
            if self.world.is_online(p) {
                self.world.health(p).unwrap_or(0.0)
            } else {
                0.0
            }
        });
        tracing::info!(%match_id, round, ?health, "round timed out");
        self.end_round(match_id, RoundEndTrigger::Timeout { health });
    }

    /// ROUND_ENDING: scores the round once, announces it and schedules
    /// whatever comes next. Later triggers for the same round are dropped.
    fn end_round(&mut self, match_id: &MatchId, trigger: RoundEndTrigger) -> bool {
        let Some(active) = self.matches.get_mut(match_id) else {
            return false;
        };
        let outcome = match active.end_round(trigger) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(%match_id, error = %e, "round-ending event discarded");
                return false;
            }
        };
        let participants = active.participants();

        if let Some(timer) = self.round_timers.remove(match_id) {
            self.timers.cancel(timer);
        }

        for (slot, p) in participants.into_iter().enumerate() {
            let verdict = match outcome.winner {
                None => arenalink_match::Outcome::Draw,
                Some(w) if w == p => arenalink_match::Outcome::Win,
                Some(_) => arenalink_match::Outcome::Loss,
            };
            self.world.notify(
                p,
                &Notice::RoundEnded {
                    round: outcome.round,
                    outcome: verdict,
                    score: Score::for_slot(outcome.scores, slot),
                },
            );
        }

        if let Some(eliminated) = outcome.eliminated {
            self.world.respawn(eliminated);
        }

        let (delay, next) = if outcome.match_over {
            (
                self.config.matches.match_end_delay,
                TimerEvent::EndMatch(match_id.clone()),
            )
        } else {
            (
                self.config.matches.next_round_delay,
                TimerEvent::NextRound(match_id.clone()),
            )
        };
        let timer = self.timers.schedule(delay, next);
        if let Some(old) = self.phase_timers.insert(match_id.clone(), timer) {
            self.timers.cancel(old);
        }
        true
    }

    /// MATCH_ENDING → ENDED: removes the match, announces the result,
    /// reports ranked results and schedules cleanup.
    pub(crate) fn end_match(&mut self, match_id: &MatchId) {
        for timer in [
            self.round_timers.remove(match_id),
            self.phase_timers.remove(match_id),
        ]
        .into_iter()
        .flatten()
        {
            self.timers.cancel(timer);
        }

        let Some(mut active) = self.matches.remove(match_id) else {
            return;
        };
        let job = CleanupJob {
            participants: active.participants(),
            origins: active.take_origins(),
            arena: active.arena().clone(),
        };

        match active.finish() {
            Ok(result) => {
                tracing::info!(
                    %match_id,
                    rounds = ?result.rounds,
                    winner = ?result.winner(),
                    "match ended"
                );
                for (slot, p) in result.participants.into_iter().enumerate() {
                    if let Some(outcome) = result.outcome_for(p) {
                        self.world.notify(
                            p,
                            &Notice::MatchEnded {
                                outcome,
                                score: Score::for_slot(result.rounds, slot),
                            },
                        );
                    }
                }

                if let Some(msg) = report::result_message(&result) {
                    match self.link.send_message(&self.codec, &msg) {
                        Ok(()) => {
                            self.reported
                                .insert(result.match_id.clone(), result.participants);
                        }
                        Err(e) => {
                            tracing::warn!(%match_id, error = %e, "failed to report match result");
                            for p in result.participants {
                                self.world.notify(p, &Notice::ResultNotSubmitted);
                            }
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(%match_id, error = %e, "match ended without a result"),
        }

        self.timers.schedule(
            self.config.matches.cleanup_delay,
            TimerEvent::Cleanup(Box::new(job)),
        );
    }

    /// Sends everyone home and frees the arena. Offline participants are
    /// restored on their next join instead.
    pub(crate) fn cleanup(&mut self, mut job: CleanupJob) {
        for p in job.participants {
            let origin = job.origins.remove(&p);
            if self.world.is_online(p) {
                self.restore(p, origin);
            } else {
                tracing::info!(participant = %p, "deferring restore until next join");
                self.pending_restores.insert(p, origin);
            }
        }
        tracing::debug!(arena = %job.arena, "releasing arena");
        self.world.release_arena(job.arena);
    }

    /// Back to the pre-match position, or the default spawn if it is
    /// missing or unusable.
    pub(crate) fn restore(&mut self, participant: ParticipantId, origin: Option<Position>) {
        self.world.clear_loadout(participant);
        self.world.reset_vitals(participant);
        let returned = origin.is_some_and(|pos| self.world.teleport(participant, &pos));
        if !returned {
            self.world.send_to_spawn(participant);
        }
    }
}

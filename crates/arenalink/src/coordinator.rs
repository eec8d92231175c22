//! The coordinator actor: the single task that owns every table.
//!
//! Queue entries, ratings, matches, timers, challenges and pending
//! restores all live here and are only touched from [`Coordinator::run`].
//! Three sources feed it, multiplexed with `tokio::select!`:
//!
//! ```text
//! CoordinatorHandle ──commands──┐
//! connection tasks ──link events┼──→ Coordinator::run ──→ World, socket
//! TimerWheel ──────expirations──┘
//! ```
//!
//! Because each event is handled to completion before the next is looked
//! at, no lock guards any of the tables, and a timer that was cancelled
//! can never fire its effect.

use std::collections::HashMap;
use std::time::Duration;

use arenalink_match::{ArenaHandle, MatchConfig, MatchRegistry, Position};
use arenalink_protocol::{Codec, JsonCodec, MatchId, OutboundMessage, ParticipantId, QueueKind};
use arenalink_queue::{QueueConfig, QueueError, QueueTracker, RatingCache};
use arenalink_timer::{TimerId, TimerWheel};
use arenalink_transport::{Connector, TransportError};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::challenge::{Challenge, ChallengeBook};
use crate::connection::{ConnectionManager, LinkEvent};
use crate::handle::Command;
use crate::{ArenalinkError, CoordinatorConfig, CoordinatorHandle, Notice, World};

// ---------------------------------------------------------------------------
// Timer events
// ---------------------------------------------------------------------------

/// Everything the coordinator schedules for later.
#[derive(Debug, Clone)]
pub(crate) enum TimerEvent {
    QueueTimeout(ParticipantId),
    RoundTimeout { match_id: MatchId, round: u32 },
    NextRound(MatchId),
    EndMatch(MatchId),
    Cleanup(Box<CleanupJob>),
    Reconnect,
    ChallengeExpired(ParticipantId),
}

/// What's left to do once a match is over and out of the registry.
#[derive(Debug, Clone)]
pub(crate) struct CleanupJob {
    pub(crate) participants: [ParticipantId; 2],
    pub(crate) origins: HashMap<ParticipantId, Position>,
    pub(crate) arena: ArenaHandle,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a coordinator.
///
/// # Example
///
/// ```rust,ignore
/// use arenalink::prelude::*;
///
/// let handle = CoordinatorBuilder::new()
///     .server_url("ws://matchmaking.internal:8000/ws")
///     .spawn(WebSocketConnector, my_world);
/// handle.enqueue(player, QueueKind::Ranked).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    pub fn command_channel_size(mut self, size: usize) -> Self {
        self.config.command_channel_size = size.max(1);
        self
    }

    pub fn outbound_buffer(mut self, size: usize) -> Self {
        self.config.outbound_buffer = size.max(1);
        self
    }

    pub fn challenge_expiry(mut self, expiry: Duration) -> Self {
        self.config.challenge_expiry = expiry;
        self
    }

    pub fn queue(mut self, config: QueueConfig) -> Self {
        self.config.queue = config;
        self
    }

    pub fn matches(mut self, config: MatchConfig) -> Self {
        self.config.matches = config;
        self
    }

    /// Builds the coordinator without starting it. Run it with
    /// [`Coordinator::run`].
    pub fn build<K: Connector, W: World>(
        self,
        connector: K,
        world: W,
    ) -> (Coordinator<K, W>, CoordinatorHandle) {
        self.build_with_codec(connector, world, JsonCodec)
    }

    pub fn build_with_codec<K: Connector, W: World, C: Codec>(
        self,
        connector: K,
        world: W,
        codec: C,
    ) -> (Coordinator<K, W, C>, CoordinatorHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_channel_size.max(1));
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let link = ConnectionManager::new(
            connector,
            self.config.server_url.clone(),
            self.config.outbound_buffer,
            link_tx,
        );

        let coordinator = Coordinator {
            queue: QueueTracker::new(self.config.queue.clone()),
            config: self.config,
            link,
            codec,
            world,
            queue_timers: HashMap::new(),
            ratings: RatingCache::new(),
            matches: MatchRegistry::new(),
            round_timers: HashMap::new(),
            phase_timers: HashMap::new(),
            reported: HashMap::new(),
            challenges: ChallengeBook::default(),
            pending_restores: HashMap::new(),
            timers: TimerWheel::new(),
            reconnect_timer: None,
            commands: cmd_rx,
            link_events: link_rx,
        };
        (coordinator, CoordinatorHandle::new(cmd_tx))
    }

    /// Builds the coordinator and runs it on a new Tokio task.
    pub fn spawn<K: Connector, W: World>(self, connector: K, world: W) -> CoordinatorHandle {
        let (coordinator, handle) = self.build(connector, world);
        tokio::spawn(coordinator.run());
        handle
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// The matchmaking client and match driver. See the module docs.
pub struct Coordinator<K: Connector, W: World, C: Codec = JsonCodec> {
    pub(crate) config: CoordinatorConfig,
    pub(crate) link: ConnectionManager<K>,
    pub(crate) codec: C,
    pub(crate) world: W,

    pub(crate) queue: QueueTracker,
    /// Timeout timer per queued participant.
    pub(crate) queue_timers: HashMap<ParticipantId, TimerId>,
    pub(crate) ratings: RatingCache,

    pub(crate) matches: MatchRegistry,
    /// At most one live round timer per match.
    pub(crate) round_timers: HashMap<MatchId, TimerId>,
    /// The pending next-round or end-of-match step per match.
    pub(crate) phase_timers: HashMap<MatchId, TimerId>,
    /// Ranked results sent but not yet acknowledged, so `result_processed`
    /// can find the participants after the match is gone.
    pub(crate) reported: HashMap<MatchId, [ParticipantId; 2]>,

    pub(crate) challenges: ChallengeBook,
    /// Where to put participants who were offline when their match was
    /// cleaned up. `None` means the default spawn.
    pub(crate) pending_restores: HashMap<ParticipantId, Option<Position>>,

    pub(crate) timers: TimerWheel<TimerEvent>,
    reconnect_timer: Option<TimerId>,

    commands: mpsc::Receiver<Command>,
    link_events: mpsc::UnboundedReceiver<LinkEvent<K::Connection>>,
}

impl<K: Connector, W: World, C: Codec> Coordinator<K, W, C> {
    /// Runs the actor loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(url = %self.config.server_url, "coordinator started");

        self.link.connect();
        self.reconnect_timer = Some(
            self.timers
                .schedule_repeating(self.config.reconnect_interval, TimerEvent::Reconnect),
        );

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        self.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                Some(event) = self.link_events.recv() => {
                    self.handle_link_event(event);
                }
                fired = self.timers.next_due() => {
                    self.handle_timer(fired.id, fired.event);
                }
            }
        }

        tracing::info!("coordinator stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Enqueue {
                participant,
                kind,
                reply,
            } => {
                let result = self.enqueue(participant, kind);
                let _ = reply.send(result);
            }
            Command::Dequeue { participant, reply } => {
                let removed = self.dequeue(participant);
                let _ = reply.send(removed);
            }
            Command::RequestRating { participant, reply } => {
                let result = self.request_rating(participant);
                let _ = reply.send(result);
            }
            Command::Rating { participant, reply } => {
                let _ = reply.send(self.ratings.get(participant));
            }
            Command::IsInMatch { participant, reply } => {
                let _ = reply.send(self.matches.contains_participant(participant));
            }
            Command::IsQueued { participant, reply } => {
                let _ = reply.send(self.queue.is_queued(participant));
            }
            Command::IsConnected { reply } => {
                let _ = reply.send(self.link.is_connected());
            }
            Command::MatchSnapshot { participant, reply } => {
                let snapshot = self
                    .matches
                    .find_by_participant(participant)
                    .map(|m| m.snapshot());
                let _ = reply.send(snapshot);
            }
            Command::Eliminated { participant, reply } => {
                let ended = self.participant_eliminated(participant);
                let _ = reply.send(ended);
            }
            Command::Joined { participant } => self.participant_joined(participant),
            Command::Left { participant } => self.participant_left(participant),
            Command::Challenge {
                challenger,
                target,
                reply,
            } => {
                let result = self.challenge(challenger, target);
                let _ = reply.send(result);
            }
            Command::AcceptChallenge { target, reply } => {
                let result = self.accept_challenge(target);
                let _ = reply.send(result);
            }
            Command::DenyChallenge { target, reply } => {
                let result = self.deny_challenge(target);
                let _ = reply.send(result);
            }
            // Handled by the run loop.
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent<K::Connection>) {
        match event {
            LinkEvent::Connected {
                generation,
                connection,
            } => {
                self.link.on_connected(generation, connection);
            }
            LinkEvent::ConnectFailed { generation, error } => {
                self.link.on_connect_failed(generation, &error);
            }
            LinkEvent::Inbound { generation, data } => {
                if self.link.accepts(generation) {
                    self.on_inbound(&data);
                }
            }
            LinkEvent::Closed { generation, reason } => {
                if self.link.on_closed(generation, &reason) {
                    self.on_disconnected();
                }
            }
        }
    }

    fn handle_timer(&mut self, id: TimerId, event: TimerEvent) {
        match event {
            TimerEvent::QueueTimeout(participant) => self.on_queue_timeout(id, participant),
            TimerEvent::RoundTimeout { match_id, round } => {
                self.on_round_timeout(id, &match_id, round)
            }
            TimerEvent::NextRound(match_id) => {
                self.phase_timers.remove(&match_id);
                self.start_round(&match_id);
            }
            TimerEvent::EndMatch(match_id) => {
                self.phase_timers.remove(&match_id);
                self.end_match(&match_id);
            }
            TimerEvent::Cleanup(job) => self.cleanup(*job),
            TimerEvent::Reconnect => {
                if !self.link.is_connected() {
                    self.link.connect();
                }
            }
            TimerEvent::ChallengeExpired(target) => self.on_challenge_expired(id, target),
        }
    }

    // -----------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------

    fn enqueue(&mut self, participant: ParticipantId, kind: QueueKind) -> Result<(), ArenalinkError> {
        if self.matches.contains_participant(participant) {
            self.world.notify(participant, &Notice::AlreadyInMatch);
            return Err(QueueError::AlreadyMatched(participant).into());
        }
        if self.queue.is_queued(participant) {
            self.world.notify(participant, &Notice::AlreadyQueued);
            return Err(QueueError::AlreadyQueued(participant).into());
        }
        if !self.link.is_connected() {
            tracing::warn!(%participant, "queue request while disconnected");
            self.world.notify(participant, &Notice::NotConnected);
            return Err(TransportError::NotConnected.into());
        }

        self.queue.enqueue(participant, kind, Instant::now())?;
        let msg = OutboundMessage::Queue {
            player_uuid: participant,
            mode: kind,
        };
        if let Err(e) = self.link.send_message(&self.codec, &msg) {
            tracing::warn!(%participant, error = %e, "failed to send queue request");
            self.queue.dequeue(participant);
            self.world.notify(participant, &Notice::NotConnected);
            return Err(e);
        }

        let timer = self
            .timers
            .schedule(self.queue.config().timeout, TimerEvent::QueueTimeout(participant));
        self.queue_timers.insert(participant, timer);
        self.world.notify(participant, &Notice::Queued { kind });
        Ok(())
    }

    fn dequeue(&mut self, participant: ParticipantId) -> bool {
        if !self.drop_from_queue(participant) {
            self.world.notify(participant, &Notice::NotQueued);
            return false;
        }
        self.link.cancel_queue(&self.codec, participant);
        self.world.notify(participant, &Notice::QueueLeft);
        true
    }

    /// Removes the local entry and its timer. No message, no notice.
    pub(crate) fn drop_from_queue(&mut self, participant: ParticipantId) -> bool {
        if let Some(timer) = self.queue_timers.remove(&participant) {
            self.timers.cancel(timer);
        }
        self.queue.dequeue(participant).is_some()
    }

    fn on_queue_timeout(&mut self, timer: TimerId, participant: ParticipantId) {
        if self.queue_timers.get(&participant) == Some(&timer) {
            self.queue_timers.remove(&participant);
        }
        if !self.queue.check_timeout(participant, Instant::now()) {
            return;
        }
        tracing::warn!(%participant, "participant timed out in queue");
        self.world.notify(participant, &Notice::QueueTimedOut);
        self.link.cancel_queue(&self.codec, participant);
    }

    /// The channel closed: every queue entry is void.
    fn on_disconnected(&mut self) {
        for participant in self.queue.clear() {
            if let Some(timer) = self.queue_timers.remove(&participant) {
                self.timers.cancel(timer);
            }
            self.world.notify(participant, &Notice::Disconnected);
        }
        // Results reported on the dropped connection won't be acknowledged.
        if !self.reported.is_empty() {
            tracing::debug!(results = self.reported.len(), "forgetting unacknowledged results");
            self.reported.clear();
        }
        if !self.matches.is_empty() {
            tracing::info!(matches = self.matches.len(), "matches continue while disconnected");
        }
    }

    // -----------------------------------------------------------------
    // Ratings
    // -----------------------------------------------------------------

    fn request_rating(&mut self, participant: ParticipantId) -> Result<(), ArenalinkError> {
        if !self.link.is_connected() {
            tracing::debug!(%participant, "rating request while disconnected");
            return Err(TransportError::NotConnected.into());
        }
        let msg = OutboundMessage::GetRating {
            player_uuid: participant,
        };
        self.link.send_message(&self.codec, &msg)
    }

    // -----------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------

    fn participant_joined(&mut self, participant: ParticipantId) {
        if let Some(origin) = self.pending_restores.remove(&participant) {
            tracing::info!(%participant, "applying deferred post-match restore");
            self.restore(participant, origin);
        }
    }

    fn participant_left(&mut self, participant: ParticipantId) {
        if self.drop_from_queue(participant) {
            tracing::info!(%participant, "queued participant left");
            self.link.cancel_queue(&self.codec, participant);
        }
        for challenge in self.challenges.remove_involving(participant) {
            self.timers.cancel(challenge.timer);
        }
        if let Some(match_id) = self.matches.match_of(participant) {
            tracing::warn!(%participant, %match_id, "participant left during a match");
        }
    }

    // -----------------------------------------------------------------
    // Challenges
    // -----------------------------------------------------------------

    fn challenge(&mut self, challenger: ParticipantId, target: ParticipantId) -> Result<(), ArenalinkError> {
        if challenger == target {
            return Err(ArenalinkError::CannotChallengeSelf(challenger));
        }
        for p in [challenger, target] {
            if self.matches.contains_participant(p) {
                return Err(QueueError::AlreadyMatched(p).into());
            }
        }
        if self.challenges.has_pending(target) {
            return Err(ArenalinkError::ChallengePending(target));
        }
        if !self.world.is_online(target) {
            return Err(arenalink_match::MatchError::ParticipantOffline(target).into());
        }

        let timer = self
            .timers
            .schedule(self.config.challenge_expiry, TimerEvent::ChallengeExpired(target));
        self.challenges.insert(Challenge {
            challenger,
            target,
            timer,
        });
        tracing::info!(%challenger, %target, "challenge issued");
        self.world.notify(challenger, &Notice::ChallengeSent { target });
        self.world.notify(target, &Notice::ChallengeReceived { challenger });
        Ok(())
    }

    fn accept_challenge(&mut self, target: ParticipantId) -> Result<MatchId, ArenalinkError> {
        let challenge = self
            .challenges
            .take(target)
            .ok_or(ArenalinkError::NoPendingChallenge(target))?;
        self.timers.cancel(challenge.timer);
        let challenger = challenge.challenger;

        if !self.world.is_online(challenger) {
            self.world.notify(target, &Notice::OpponentOffline);
            return Err(arenalink_match::MatchError::ParticipantOffline(challenger).into());
        }
        for p in [challenger, target] {
            if self.matches.contains_participant(p) {
                self.world.notify(target, &Notice::AlreadyInMatch);
                return Err(QueueError::AlreadyMatched(p).into());
            }
        }

        let match_id = MatchId::duel();
        tracing::info!(%challenger, %target, %match_id, "challenge accepted");
        self.start_match(match_id.clone(), [challenger, target], QueueKind::Casual)?;
        Ok(match_id)
    }

    fn deny_challenge(&mut self, target: ParticipantId) -> Result<(), ArenalinkError> {
        let challenge = self
            .challenges
            .take(target)
            .ok_or(ArenalinkError::NoPendingChallenge(target))?;
        self.timers.cancel(challenge.timer);
        self.world
            .notify(challenge.challenger, &Notice::ChallengeDenied { target });
        self.world.notify(
            target,
            &Notice::ChallengeDeclined {
                challenger: challenge.challenger,
            },
        );
        Ok(())
    }

    fn on_challenge_expired(&mut self, timer: TimerId, target: ParticipantId) {
        let Some(challenge) = self.challenges.take_expired(target, timer) else {
            return;
        };
        tracing::debug!(challenger = %challenge.challenger, %target, "challenge expired");
        self.world.notify(
            challenge.challenger,
            &Notice::ChallengeExpired { other: target },
        );
        self.world.notify(
            target,
            &Notice::ChallengeExpired {
                other: challenge.challenger,
            },
        );
    }

    // -----------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------

    fn shutdown(&mut self) {
        tracing::info!("coordinator shutting down");
        if let Some(timer) = self.reconnect_timer.take() {
            self.timers.cancel(timer);
        }
        for participant in self.queue.clear() {
            if let Some(timer) = self.queue_timers.remove(&participant) {
                self.timers.cancel(timer);
            }
            self.link.cancel_queue(&self.codec, participant);
            self.world.notify(participant, &Notice::Disconnected);
        }
        for challenge in self.challenges.drain() {
            self.timers.cancel(challenge.timer);
        }
        if !self.matches.is_empty() {
            tracing::warn!(matches = self.matches.len(), "abandoning matches in progress");
        }
        self.link.close();
    }
}

//! Inbound message handling: one method per message type.

use arenalink_protocol::{
    Codec, InboundMessage, MatchId, MessageTag, ParticipantId, QueueKind, Rating,
    RemoteErrorKind,
};
use arenalink_transport::Connector;

use crate::coordinator::Coordinator;
use crate::{Notice, World};

impl<K: Connector, W: World, C: Codec> Coordinator<K, W, C> {
    /// Decodes one frame and routes it by its `type`.
    pub(crate) fn on_inbound(&mut self, data: &[u8]) {
        let msg: InboundMessage = match self.codec.decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "malformed message from matchmaking service");
                return;
            }
        };

        match msg {
            InboundMessage::Queued { mode, rating, .. } => self.on_queued(mode, rating),
            InboundMessage::MatchFound {
                match_uuid,
                player1_uuid,
                player2_uuid,
            } => self.on_match_found(match_uuid, player1_uuid, player2_uuid),
            InboundMessage::ResultProcessed {
                match_uuid,
                player1_new_rating,
                player2_new_rating,
                message,
            } => self.on_result_processed(
                &match_uuid,
                [player1_new_rating, player2_new_rating],
                message,
            ),
            InboundMessage::QueueCancelled { message } => self.on_queue_cancelled(message),
            InboundMessage::RatingResponse {
                player_uuid,
                rating,
            } => self.ratings.set(player_uuid, rating),
            InboundMessage::Error { message } => self.on_remote_error(&message),
            InboundMessage::Unknown => {
                let kind = self
                    .codec
                    .decode::<MessageTag>(data)
                    .map(|tag| tag.kind)
                    .unwrap_or_default();
                tracing::warn!(%kind, "unknown message type from matchmaking service");
            }
        }
    }

    /// The participant the service's un-addressed replies refer to, if
    /// they're still waiting.
    fn last_queued_participant(&self) -> Option<ParticipantId> {
        self.queue
            .last_queued()
            .filter(|p| self.queue.is_queued(*p))
    }

    fn on_queued(&mut self, mode: QueueKind, rating: Rating) {
        let Some(participant) = self.last_queued_participant() else {
            tracing::debug!("queue confirmation for nobody");
            return;
        };
        let rating = mode.is_ranked().then_some(rating);
        if let Some(r) = rating {
            self.ratings.set(participant, r);
        }
        tracing::info!(%participant, %mode, ?rating, "queue confirmed");
        self.world
            .notify(participant, &Notice::QueueConfirmed { kind: mode, rating });
    }

    fn on_queue_cancelled(&mut self, message: Option<String>) {
        let Some(participant) = self.last_queued_participant() else {
            tracing::debug!("queue cancellation for nobody");
            return;
        };
        self.drop_from_queue(participant);
        let message = message.unwrap_or_else(|| "Removed from queue".to_string());
        self.world
            .notify(participant, &Notice::QueueCancelled { message });
    }

    fn on_remote_error(&mut self, message: &str) {
        let kind = RemoteErrorKind::classify(message);
        let Some(participant) = self.last_queued_participant() else {
            tracing::warn!(error = %message, "matchmaking service error");
            return;
        };
        tracing::warn!(%participant, error = %message, "matchmaking service rejected request");
        self.drop_from_queue(participant);
        self.world.notify(participant, &Notice::RemoteError(kind));
    }

    fn on_match_found(
        &mut self,
        match_id: MatchId,
        player1: ParticipantId,
        player2: ParticipantId,
    ) {
        tracing::info!(%match_id, %player1, %player2, "match found");

        for p in [player1, player2] {
            if let Some(existing) = self.matches.match_of(p) {
                tracing::warn!(
                    %match_id,
                    participant = %p,
                    %existing,
                    "duplicate assignment, discarding"
                );
                return;
            }
        }

        let kind = self
            .queue
            .kind_of(player1)
            .or_else(|| self.queue.kind_of(player2))
            .unwrap_or(QueueKind::Ranked);

        let participants = [player1, player2];
        let online = participants.map(|p| self.world.is_online(p));
        if online.contains(&false) {
            tracing::warn!(%match_id, ?online, "participant offline, aborting match");
            for (p, is_online) in participants.into_iter().zip(online) {
                self.drop_from_queue(p);
                if is_online {
                    self.world.notify(p, &Notice::OpponentOffline);
                }
            }
            return;
        }

        if let Err(e) = self.start_match(match_id.clone(), participants, kind) {
            tracing::warn!(%match_id, error = %e, "could not start match");
        }
    }

    fn on_result_processed(
        &mut self,
        match_id: &MatchId,
        new_ratings: [Option<Rating>; 2],
        message: Option<String>,
    ) {
        let Some(participants) = self.reported.remove(match_id) else {
            tracing::debug!(%match_id, "result acknowledged for unknown match");
            return;
        };
        if new_ratings.iter().all(Option::is_none) {
            tracing::info!(%match_id, message = message.as_deref().unwrap_or(""), "result recorded");
            return;
        }
        for (participant, rating) in participants.into_iter().zip(new_ratings) {
            if let Some(rating) = rating {
                self.ratings.set(participant, rating);
                self.world
                    .notify(participant, &Notice::RatingUpdated { rating });
            }
        }
        tracing::info!(%match_id, ?new_ratings, "ratings updated");
    }
}

//! Result reporting: turns a finished match into the upstream message.

use arenalink_match::MatchResult;
use arenalink_protocol::OutboundMessage;

/// The `match_result` message for a finished match, in originally
/// assigned player order. Casual matches are never reported.
pub fn result_message(result: &MatchResult) -> Option<OutboundMessage> {
    if !result.kind.is_ranked() {
        return None;
    }
    Some(OutboundMessage::MatchResult {
        match_uuid: result.match_id.clone(),
        player1_uuid: result.participants[0],
        player2_uuid: result.participants[1],
        player1_rounds: result.rounds[0],
        player2_rounds: result.rounds[1],
    })
}

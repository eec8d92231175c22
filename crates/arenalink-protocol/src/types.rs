//! Core protocol types for the matchmaking wire format.
//!
//! Every message is a JSON object carrying a `"type"` tag plus flat fields,
//! e.g. `{"type":"queue","player_uuid":"…","mode":"ranked"}`. Both enums use
//! serde's internally tagged representation with snake_case tags so the
//! derive output matches the service byte-for-byte.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

/// A participant's skill rating as reported by the service.
pub type Rating = i32;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Stable, globally unique participant identity (128-bit UUID).
///
/// The sole key for queue membership, match membership and the rating
/// cache. Serializes as the hyphenated UUID string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Generates a fresh random identity.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ParticipantId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ProtocolError::InvalidMessage(format!("invalid participant id {s:?}: {e}")))
    }
}

/// Identifier of one match.
///
/// Service-assigned matches carry a UUID string; locally started duels use
/// a `duel-` prefix. Either way it is opaque text on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    /// Mints the id for a directly arranged (non-matchmade) duel.
    pub fn duel() -> Self {
        Self(format!("duel-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// QueueKind
// ---------------------------------------------------------------------------

/// Which queue a participant waits in.
///
/// `Casual` matches never touch ratings; `Ranked` results are reported
/// upstream. Lowercase on the wire (`"casual"`, `"ranked"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    #[default]
    Casual,
    Ranked,
}

impl QueueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Ranked => "ranked",
        }
    }

    pub fn is_ranked(self) -> bool {
        matches!(self, Self::Ranked)
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the spellings players type in chat: `casual`/`cas` and
/// `ranked`/`competitive`/`comp`, case-insensitively.
impl FromStr for QueueKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "casual" | "cas" => Ok(Self::Casual),
            "ranked" | "competitive" | "comp" => Ok(Self::Ranked),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown queue kind: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound: coordinator → service
// ---------------------------------------------------------------------------

/// Messages the coordinator sends to the matchmaking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Put a participant in the given queue.
    Queue {
        player_uuid: ParticipantId,
        mode: QueueKind,
    },

    /// Leave the queue. The service resolves who from the connection.
    CancelQueue,

    /// Ask for a participant's current rating.
    GetRating { player_uuid: ParticipantId },

    /// Final round counts of a ranked match, in assignment order.
    MatchResult {
        match_uuid: MatchId,
        player1_uuid: ParticipantId,
        player2_uuid: ParticipantId,
        player1_rounds: u32,
        player2_rounds: u32,
    },
}

impl OutboundMessage {
    /// The wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Queue { .. } => "queue",
            Self::CancelQueue => "cancel_queue",
            Self::GetRating { .. } => "get_rating",
            Self::MatchResult { .. } => "match_result",
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: service → coordinator
// ---------------------------------------------------------------------------

/// Messages the matchmaking service sends to the coordinator.
///
/// Any tag not listed here decodes as [`InboundMessage::Unknown`] instead of
/// failing, so a newer service can't knock the dispatcher over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// The last queue request was accepted.
    Queued {
        #[serde(default)]
        mode: QueueKind,
        #[serde(default, deserialize_with = "rating_number::deserialize")]
        rating: Rating,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The service paired two participants.
    MatchFound {
        match_uuid: MatchId,
        player1_uuid: ParticipantId,
        player2_uuid: ParticipantId,
    },

    /// A submitted match result was recorded. Ratings are present for
    /// ranked matches only.
    ResultProcessed {
        match_uuid: MatchId,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "rating_number::deserialize_option"
        )]
        player1_new_rating: Option<Rating>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "rating_number::deserialize_option"
        )]
        player2_new_rating: Option<Rating>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// A `cancel_queue` was acknowledged.
    QueueCancelled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Answer to `get_rating`.
    RatingResponse {
        player_uuid: ParticipantId,
        #[serde(deserialize_with = "rating_number::deserialize")]
        rating: Rating,
    },

    /// The service rejected something. Free text, see
    /// [`RemoteErrorKind::classify`](crate::RemoteErrorKind::classify).
    Error {
        #[serde(default)]
        message: String,
    },

    /// Any other `type`.
    #[serde(other)]
    Unknown,
}

/// Ratings may arrive as `1500` or `1500.0`; either way they are read as
/// whole numbers, truncating toward zero and saturating at the `Rating`
/// bounds.
mod rating_number {
    use serde::{Deserialize, Deserializer};

    use super::Rating;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    impl Number {
        fn truncate(self) -> Rating {
            match self {
                Number::Int(n) => n.clamp(Rating::MIN.into(), Rating::MAX.into()) as Rating,
                // `as` saturates and maps NaN to 0.
                Number::Float(f) => f as Rating,
            }
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rating, D::Error> {
        Number::deserialize(d).map(Number::truncate)
    }

    pub(super) fn deserialize_option<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Rating>, D::Error> {
        Option::<Number>::deserialize(d).map(|n| n.map(Number::truncate))
    }
}

/// Just the `"type"` field of an envelope, for logging messages that
/// didn't decode into a known variant.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageTag {
    #[serde(rename = "type")]
    pub kind: String,
}

// =========================================================================
// Tests
// =========================================================================

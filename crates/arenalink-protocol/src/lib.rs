//! Wire protocol for arenalink.
//!
//! This crate defines what the coordinator and the matchmaking service say
//! to each other:
//!
//! - **Types** ([`OutboundMessage`], [`InboundMessage`], [`ParticipantId`],
//!   [`MatchId`], [`QueueKind`]): the tagged envelopes on the wire.
//! - **Remote errors** ([`RemoteErrorKind`]): classification of the free
//!   text the service puts in `error` messages.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes to/from envelopes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about sockets, queues or rounds.
//!
//! ```text
//! Transport (bytes) → Protocol (envelopes) → Coordinator (queue, matches)
//! ```

mod codec;
mod error;
mod remote;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use remote::RemoteErrorKind;
pub use types::{
    InboundMessage, MatchId, MessageTag, OutboundMessage, ParticipantId,
    QueueKind, Rating,
};

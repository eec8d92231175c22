//! # arenalink
//!
//! Matchmaking client and match coordinator for two-player arena games.
//!
//! arenalink keeps a persistent channel to an external matchmaking service,
//! tracks who is queued, turns `match_found` assignments into best-of-five
//! matches, drives the rounds with timers, and reports ranked results back
//! upstream. The host game plugs in through the [`World`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arenalink::prelude::*;
//!
//! # async fn run(world: impl World, player: ParticipantId) -> Result<(), ArenalinkError> {
//! let handle = CoordinatorBuilder::new()
//!     .server_url("ws://localhost:8000/ws")
//!     .spawn(WebSocketConnector, world);
//!
//! handle.enqueue(player, QueueKind::Ranked).await?;
//! # Ok(())
//! # }
//! ```

mod challenge;
mod config;
mod connection;
mod coordinator;
mod dispatch;
mod error;
mod handle;
mod notice;
mod report;
mod rounds;
mod world;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::ArenalinkError;
pub use handle::CoordinatorHandle;
pub use notice::{Notice, Score};
pub use report::result_message;
pub use world::World;

pub use arenalink_match as matches;
pub use arenalink_protocol as protocol;
pub use arenalink_queue as queue;
pub use arenalink_timer as timer;
pub use arenalink_transport as transport;

/// The types most hosts need.
pub mod prelude {
    pub use crate::{
        ArenalinkError, CoordinatorBuilder, CoordinatorConfig, CoordinatorHandle, Notice,
        Score, World,
    };
    pub use arenalink_match::{ArenaHandle, MatchConfig, MatchSnapshot, Outcome, Position};
    pub use arenalink_protocol::{MatchId, ParticipantId, QueueKind, Rating};
    pub use arenalink_queue::QueueConfig;
    pub use arenalink_transport::WebSocketConnector;
}

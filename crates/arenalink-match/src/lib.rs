//! Match lifecycle for arenalink.
//!
//! Every match is an [`ActiveMatch`] held by the [`MatchRegistry`], the
//! single source of truth for "is this participant currently playing".
//! The round state machine lives on [`ActiveMatch`] itself; the phase
//! enum decides which transitions are legal, so a second round-ending
//! event for the same round is rejected instead of scoring twice.
//!
//! This crate is pure state. Timers, notices and the arena itself are
//! driven by the coordinator.
//!
//! # Key types
//!
//! - [`ActiveMatch`]: scores, round counter and phase of one match
//! - [`MatchPhase`]: `Starting → RoundActive → RoundEnding → … → Ended`
//! - [`MatchRegistry`]: match id ↔ participants index
//! - [`MatchResult`]: final, immutable outcome handed to the reporter
//! - [`MatchConfig`]: rounds to win and the delays between phases

mod active;
mod config;
mod error;
mod registry;

pub use active::{
    ActiveMatch, ArenaHandle, MatchResult, MatchSnapshot, Outcome, Position,
    RoundEndTrigger, RoundOutcome,
};
pub use config::{MatchConfig, MatchPhase};
pub use error::MatchError;
pub use registry::MatchRegistry;

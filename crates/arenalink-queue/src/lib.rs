//! Queue bookkeeping for arenalink.
//!
//! This crate tracks the participant side of matchmaking:
//!
//! 1. **Queue tracking**: who is waiting for a match, in which queue, and
//!    since when ([`QueueTracker`]). Local state is authoritative; the
//!    remote service is told about changes on a best-effort basis.
//! 2. **Timeout eviction**: entries older than [`QueueConfig::timeout`]
//!    are dropped even if the service never answers.
//! 3. **Rating cache**: the last rating the service reported for each
//!    participant ([`RatingCache`]). Entries never expire; a stale read is
//!    fine until a fresh response arrives.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← owns one QueueTracker and one RatingCache
//!     ↕
//! Queue Layer (this crate)  ← pure tables, no I/O
//!     ↕
//! Protocol Layer (below)  ← provides ParticipantId, QueueKind, Rating
//! ```
//!
//! Nothing here is thread-safe by itself. The tables are owned by the
//! coordinator task and only touched from there.

mod entry;
mod error;
mod rating;
mod tracker;

pub use entry::{QueueConfig, QueueEntry};
pub use error::QueueError;
pub use rating::{RatingCache, RatingEntry};
pub use tracker::QueueTracker;

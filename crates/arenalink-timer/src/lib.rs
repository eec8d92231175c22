//! Cancellable timers for the arenalink coordinator.
//!
//! Every delayed action the coordinator takes (queue timeouts, round
//! timeouts, the pause between rounds, post-match cleanup, reconnect
//! attempts) is an entry in one [`TimerWheel`]. Entries are keyed by a
//! [`TimerId`] so the owner can cancel exactly the timer it armed, and
//! fired timers come back as plain values instead of running callbacks.
//!
//! # Integration
//!
//! The wheel sits inside the coordinator's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         fired = timers.next_due() => {
//!             self.on_timer(fired.id, fired.event);
//!         }
//!     }
//! }
//! ```
//!
//! When nothing is scheduled, [`TimerWheel::next_due`] pends forever and the
//! other branches keep running.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// TimerId
// ---------------------------------------------------------------------------

/// Handle to a scheduled timer, unique for the lifetime of its wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// A timer that came due, returned by [`TimerWheel::next_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub id: TimerId,
    pub event: E,
}

struct Entry<E> {
    deadline: Instant,
    event: E,
    /// `Some` for repeating timers.
    period: Option<Duration>,
}

// ---------------------------------------------------------------------------
// TimerWheel
// ---------------------------------------------------------------------------

/// A set of pending timers ordered by deadline.
///
/// Timers with the same deadline fire in the order they were scheduled.
pub struct TimerWheel<E> {
    next_id: u64,
    /// Ordered view used to find the earliest deadline.
    queue: BTreeSet<(Instant, TimerId)>,
    entries: HashMap<TimerId, Entry<E>>,
}

impl<E> Default for TimerWheel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerWheel<E> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            queue: BTreeSet::new(),
            entries: HashMap::new(),
        }
    }

    /// Fires `event` once after `delay`.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        self.insert(delay, event, None)
    }

    /// Cancels a pending timer. Returns `false` if it already fired or was
    /// never scheduled here.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                self.queue.remove(&(entry.deadline, id));
                trace!(%id, "timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Time left before `id` fires, or `None` if it isn't pending.
    pub fn remaining(&self, id: TimerId) -> Option<Duration> {
        self.entries
            .get(&id)
            .map(|e| e.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.entries.clear();
    }

    fn insert(&mut self, delay: Duration, event: E, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = Instant::now() + delay;
        self.queue.insert((deadline, id));
        self.entries.insert(
            id,
            Entry {
                deadline,
                event,
                period,
            },
        );
        debug!(%id, delay_ms = delay.as_millis() as u64, repeating = period.is_some(), "timer scheduled");
        id
    }
}

impl<E: Clone> TimerWheel<E> {
    /// Fires `event` every `period`, first after one full period.
    ///
    /// The next deadline is measured from the moment the previous one was
    /// observed, so a stalled loop never produces a burst of catch-up fires.
    pub fn schedule_repeating(&mut self, period: Duration, event: E) -> TimerId {
        self.insert(period, event, Some(period))
    }

    /// Waits for the earliest pending timer and returns it.
    ///
    /// Cancel-safe: the wheel is only modified after the deadline has been
    /// reached, so dropping this future inside `select!` loses nothing.
    /// Pends forever while the wheel is empty.
    pub async fn next_due(&mut self) -> Fired<E> {
        loop {
            let Some(&(deadline, id)) = self.queue.first() else {
                return std::future::pending().await;
            };

            time::sleep_until(deadline).await;
            self.queue.pop_first();

            let Some(entry) = self.entries.remove(&id) else {
                continue;
            };

            let event = match entry.period {
                Some(period) => {
                    let next = Instant::now() + period;
                    let event = entry.event.clone();
                    self.queue.insert((next, id));
                    self.entries.insert(
                        id,
                        Entry {
                            deadline: next,
                            event: entry.event,
                            period: entry.period,
                        },
                    );
                    event
                }
                None => entry.event,
            };

            trace!(%id, "timer fired");
            return Fired { id, event };
        }
    }
}

impl<E> fmt::Debug for TimerWheel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerWheel")
            .field("pending", &self.entries.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Serde adapter storing a [`Duration`] as whole seconds.
///
/// ```ignore
/// #[serde(with = "arenalink_timer::serde_secs")]
/// pub timeout: Duration,
/// ```
pub mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

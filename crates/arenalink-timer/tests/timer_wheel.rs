//! Integration tests for the timer wheel.
//!
//! All tests run with paused time so `sleep_until` resolves as soon as the
//! runtime is otherwise idle.

use std::time::Duration;

use arenalink_timer::{TimerId, TimerWheel};
use tokio::time::{self, Instant};

// =========================================================================
// Helpers
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Ev {
    A,
    B,
    C,
}

// =========================================================================
// Scheduling and ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_one_shot_fires_after_delay() {
    let mut wheel = TimerWheel::new();
    let start = Instant::now();
    let id = wheel.schedule(Duration::from_secs(5), Ev::A);

    let fired = wheel.next_due().await;
    assert_eq!(fired.id, id);
    assert_eq!(fired.event, Ev::A);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert!(wheel.is_empty());
    assert!(!wheel.is_pending(id));
}

#[tokio::test(start_paused = true)]
async fn test_timers_fire_in_deadline_order() {
    let mut wheel = TimerWheel::new();
    wheel.schedule(Duration::from_secs(3), Ev::C);
    wheel.schedule(Duration::from_secs(1), Ev::A);
    wheel.schedule(Duration::from_secs(2), Ev::B);

    assert_eq!(wheel.next_due().await.event, Ev::A);
    assert_eq!(wheel.next_due().await.event, Ev::B);
    assert_eq!(wheel.next_due().await.event, Ev::C);
}

#[tokio::test(start_paused = true)]
async fn test_same_deadline_fires_in_schedule_order() {
    let mut wheel = TimerWheel::new();
    wheel.schedule(Duration::from_secs(1), Ev::B);
    wheel.schedule(Duration::from_secs(1), Ev::A);

    assert_eq!(wheel.next_due().await.event, Ev::B);
    assert_eq!(wheel.next_due().await.event, Ev::A);
}

#[test]
fn test_timer_ids_are_unique() {
    let mut wheel = TimerWheel::new();
    let a: TimerId = wheel.schedule(Duration::from_secs(1), Ev::A);
    let b = wheel.schedule(Duration::from_secs(1), Ev::A);
    assert_ne!(a, b);
    assert_eq!(wheel.len(), 2);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let mut wheel = TimerWheel::new();
    let a = wheel.schedule(Duration::from_secs(1), Ev::A);
    wheel.schedule(Duration::from_secs(2), Ev::B);

    assert!(wheel.cancel(a));
    assert!(!wheel.cancel(a));

    let fired = wheel.next_due().await;
    assert_eq!(fired.event, Ev::B);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_fire_returns_false() {
    let mut wheel = TimerWheel::new();
    let a = wheel.schedule(Duration::from_millis(10), Ev::A);
    wheel.next_due().await;
    assert!(!wheel.cancel(a));
}

#[tokio::test(start_paused = true)]
async fn test_empty_wheel_pends_forever() {
    let mut wheel: TimerWheel<Ev> = TimerWheel::new();
    let result = time::timeout(Duration::from_secs(3600), wheel.next_due()).await;
    assert!(result.is_err(), "empty wheel should never fire");
}

#[tokio::test(start_paused = true)]
async fn test_next_due_is_cancel_safe() {
    let mut wheel = TimerWheel::new();
    wheel.schedule(Duration::from_secs(10), Ev::A);

    // Drop the future halfway through the wait.
    let early = time::timeout(Duration::from_secs(4), wheel.next_due()).await;
    assert!(early.is_err());
    assert_eq!(wheel.len(), 1);

    let fired = wheel.next_due().await;
    assert_eq!(fired.event, Ev::A);
}

#[tokio::test(start_paused = true)]
async fn test_earlier_timer_added_after_wait_started_wins() {
    let mut wheel = TimerWheel::new();
    wheel.schedule(Duration::from_secs(10), Ev::A);
    let _ = time::timeout(Duration::from_secs(1), wheel.next_due()).await;

    wheel.schedule(Duration::from_secs(1), Ev::B);
    assert_eq!(wheel.next_due().await.event, Ev::B);
}

// =========================================================================
// Repeating timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_repeating_timer_fires_each_period() {
    let mut wheel = TimerWheel::new();
    let start = Instant::now();
    let id = wheel.schedule_repeating(Duration::from_secs(60), Ev::A);

    for n in 1..=3u64 {
        let fired = wheel.next_due().await;
        assert_eq!(fired.id, id);
        assert_eq!(start.elapsed(), Duration::from_secs(60 * n));
    }
    assert!(wheel.is_pending(id));

    assert!(wheel.cancel(id));
    assert!(wheel.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remaining_counts_down() {
    let mut wheel = TimerWheel::new();
    let id = wheel.schedule(Duration::from_secs(180), Ev::A);
    time::advance(Duration::from_secs(30)).await;
    assert_eq!(wheel.remaining(id), Some(Duration::from_secs(150)));

    wheel.cancel(id);
    assert_eq!(wheel.remaining(id), None);
}

// =========================================================================
// serde_secs
// =========================================================================

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Knob {
    #[serde(with = "arenalink_timer::serde_secs")]
    delay: Duration,
}

#[test]
fn test_serde_secs_uses_whole_seconds() {
    let knob = Knob {
        delay: Duration::from_secs(180),
    };
    let json = serde_json::to_string(&knob).unwrap();
    assert_eq!(json, r#"{"delay":180}"#);
    let back: Knob = serde_json::from_str(&json).unwrap();
    assert_eq!(back, knob);
}

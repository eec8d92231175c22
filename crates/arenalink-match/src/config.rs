//! Match configuration and the round state machine's phases.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Timing and scoring for matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Round wins needed to take the match. Default 3 (best of five).
    pub rounds_to_win: u32,

    /// How long a round may run before it is decided on health.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub round_timeout: Duration,

    /// Pause between a decided round and the next one.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub next_round_delay: Duration,

    /// Pause between the deciding round and the final announcement.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub match_end_delay: Duration,

    /// Pause between the final announcement and sending everyone home.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub cleanup_delay: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds_to_win: 3,
            round_timeout: Duration::from_secs(180),
            next_round_delay: Duration::from_secs(5),
            match_end_delay: Duration::from_secs(3),
            cleanup_delay: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Where a match is in its lifecycle.
///
/// ```text
/// Starting → RoundActive → RoundEnding ─┬→ RoundActive (next round)
///                                       └→ MatchEnding → Ended
/// ```
///
/// A round can only end from `RoundActive`, and only once: the first
/// trigger moves the match to `RoundEnding` (or `MatchEnding`) and every
/// later trigger for that round finds the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MatchPhase {
    Starting,
    RoundActive { round: u32 },
    RoundEnding { round: u32 },
    MatchEnding,
    Ended,
}

impl MatchPhase {
    /// Returns `true` while a round is being fought.
    pub fn is_round_active(&self) -> bool {
        matches!(self, Self::RoundActive { .. })
    }

    /// Returns `true` if a new round may start from here.
    pub fn can_begin_round(&self) -> bool {
        matches!(self, Self::Starting | Self::RoundEnding { .. })
    }

    /// Returns `true` once the match has been decided.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::MatchEnding | Self::Ended)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::RoundActive { round } => write!(f, "RoundActive({round})"),
            Self::RoundEnding { round } => write!(f, "RoundEnding({round})"),
            Self::MatchEnding => write!(f, "MatchEnding"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_phase_can_begin_round() {
        assert!(MatchPhase::Starting.can_begin_round());
        assert!(MatchPhase::RoundEnding { round: 2 }.can_begin_round());
        assert!(!MatchPhase::RoundActive { round: 1 }.can_begin_round());
        assert!(!MatchPhase::MatchEnding.can_begin_round());
        assert!(!MatchPhase::Ended.can_begin_round());
    }

    #[test]
    fn test_match_phase_is_over() {
        assert!(!MatchPhase::Starting.is_over());
        assert!(!MatchPhase::RoundActive { round: 1 }.is_over());
        assert!(MatchPhase::MatchEnding.is_over());
        assert!(MatchPhase::Ended.is_over());
    }

    #[test]
    fn test_match_phase_display() {
        assert_eq!(MatchPhase::RoundActive { round: 3 }.to_string(), "RoundActive(3)");
        assert_eq!(MatchPhase::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_match_config_default_is_best_of_five() {
        let config = MatchConfig::default();
        assert_eq!(config.rounds_to_win, 3);
        assert_eq!(config.round_timeout, Duration::from_secs(180));
        assert_eq!(config.next_round_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_match_config_partial_json_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"round_timeout":60}"#).unwrap();
        assert_eq!(config.round_timeout, Duration::from_secs(60));
        assert_eq!(config.rounds_to_win, 3);
    }
}

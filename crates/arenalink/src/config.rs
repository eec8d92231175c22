//! Coordinator configuration.

use std::time::Duration;

use arenalink_match::MatchConfig;
use arenalink_queue::QueueConfig;
use serde::{Deserialize, Serialize};

/// Everything the coordinator can be tuned with.
///
/// Missing fields fall back to [`Default`], so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// WebSocket URL of the matchmaking service.
    pub server_url: String,

    /// How often to try again while disconnected.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub reconnect_interval: Duration,

    /// Capacity of the command channel behind every handle.
    pub command_channel_size: usize,

    /// Frames that may wait for the socket writer before sends fail.
    pub outbound_buffer: usize,

    /// How long a direct challenge waits for an answer.
    #[serde(with = "arenalink_timer::serde_secs")]
    pub challenge_expiry: Duration,

    pub queue: QueueConfig,

    pub matches: MatchConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8000/ws".to_string(),
            reconnect_interval: Duration::from_secs(60),
            command_channel_size: 256,
            outbound_buffer: 256,
            challenge_expiry: Duration::from_secs(60),
            queue: QueueConfig::default(),
            matches: MatchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.server_url, "ws://localhost:8000/ws");
        assert_eq!(config.reconnect_interval, Duration::from_secs(60));
        assert_eq!(config.queue.timeout, Duration::from_secs(300));
        assert_eq!(config.matches.rounds_to_win, 3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CoordinatorConfig = serde_json::from_str(
            r#"{"server_url":"ws://mm.internal/ws","queue":{"timeout":30}}"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "ws://mm.internal/ws");
        assert_eq!(config.queue.timeout, Duration::from_secs(30));
        assert_eq!(config.challenge_expiry, Duration::from_secs(60));
        assert_eq!(config.outbound_buffer, 256);
        assert_eq!(config.matches, MatchConfig::default());
    }
}

//! Classification of the service's free-text `error` messages.

use std::fmt;

use crate::QueueKind;

/// What an inbound `error` message means to a participant.
///
/// The service only sends prose. [`RemoteErrorKind::classify`] maps the
/// phrases it is known to use onto variants so the coordinator can pick a
/// user-facing explanation; anything unrecognised is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The named queue has been switched off service-side.
    QueueDisabled(QueueKind),
    /// A request lacked the participant id.
    MissingField,
    /// A match result was rejected.
    ResultSubmissionFailed,
    /// Anything else, with the original text.
    Generic(String),
}

impl RemoteErrorKind {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("queue is currently disabled") {
            if lower.contains("ranked") {
                return Self::QueueDisabled(QueueKind::Ranked);
            }
            if lower.contains("casual") {
                return Self::QueueDisabled(QueueKind::Casual);
            }
        }
        if lower.contains("player_uuid required") {
            return Self::MissingField;
        }
        if lower.contains("missing match result data") {
            return Self::ResultSubmissionFailed;
        }
        Self::Generic(message.to_owned())
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueDisabled(QueueKind::Ranked) => {
                f.write_str("Ranked queue is currently disabled. Try casual instead.")
            }
            Self::QueueDisabled(QueueKind::Casual) => {
                f.write_str("Casual queue is currently disabled.")
            }
            Self::MissingField => f.write_str("Request was missing your player id."),
            Self::ResultSubmissionFailed => {
                f.write_str("Failed to submit the match result.")
            }
            Self::Generic(text) => write!(f, "Matchmaking error: {text}"),
        }
    }
}

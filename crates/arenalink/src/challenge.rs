//! Pending direct challenges, keyed by the challenged participant.

use std::collections::HashMap;

use arenalink_protocol::ParticipantId;
use arenalink_timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Challenge {
    pub(crate) challenger: ParticipantId,
    pub(crate) target: ParticipantId,
    /// Expiry timer armed when the challenge was issued.
    pub(crate) timer: TimerId,
}

/// At most one pending challenge per target.
#[derive(Debug, Default)]
pub(crate) struct ChallengeBook {
    by_target: HashMap<ParticipantId, Challenge>,
}

impl ChallengeBook {
    pub(crate) fn has_pending(&self, target: ParticipantId) -> bool {
        self.by_target.contains_key(&target)
    }

    pub(crate) fn insert(&mut self, challenge: Challenge) {
        self.by_target.insert(challenge.target, challenge);
    }

    pub(crate) fn take(&mut self, target: ParticipantId) -> Option<Challenge> {
        self.by_target.remove(&target)
    }

    /// Removes the challenge only if it is still the one `timer` was armed
    /// for.
    pub(crate) fn take_expired(&mut self, target: ParticipantId, timer: TimerId) -> Option<Challenge> {
        match self.by_target.get(&target) {
            Some(c) if c.timer == timer => self.by_target.remove(&target),
            _ => None,
        }
    }

    /// Removes every challenge `participant` issued or received.
    pub(crate) fn remove_involving(&mut self, participant: ParticipantId) -> Vec<Challenge> {
        let targets: Vec<_> = self
            .by_target
            .values()
            .filter(|c| c.challenger == participant || c.target == participant)
            .map(|c| c.target)
            .collect();
        targets
            .into_iter()
            .filter_map(|t| self.by_target.remove(&t))
            .collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<Challenge> {
        self.by_target.drain().map(|(_, c)| c).collect()
    }
}

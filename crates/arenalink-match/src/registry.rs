//! Match registry: tracks every running match and who plays in it.

use std::collections::HashMap;

use arenalink_protocol::{MatchId, ParticipantId};

use crate::{ActiveMatch, MatchError};

/// Owns every [`ActiveMatch`] and indexes participants to matches.
///
/// A participant is in at most ONE match at a time (key invariant); the
/// index is kept in sync on every insert and remove.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    /// Active matches, keyed by match id.
    matches: HashMap<MatchId, ActiveMatch>,

    /// Maps each playing participant to their match.
    participant_matches: HashMap<ParticipantId, MatchId>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a match.
    ///
    /// # Errors
    /// - [`MatchError::DuplicateAssignment`]: a participant is already
    ///   playing; nothing is registered
    /// - [`MatchError::AlreadyExists`]: the match id is taken
    pub fn insert(&mut self, active: ActiveMatch) -> Result<&mut ActiveMatch, MatchError> {
        for participant in active.participants() {
            if self.participant_matches.contains_key(&participant) {
                return Err(MatchError::DuplicateAssignment(participant));
            }
        }
        let id = active.id().clone();
        if self.matches.contains_key(&id) {
            return Err(MatchError::AlreadyExists(id));
        }

        for participant in active.participants() {
            self.participant_matches.insert(participant, id.clone());
        }
        tracing::info!(match_id = %id, "match registered");
        Ok(self.matches.entry(id).or_insert(active))
    }

    /// Unregisters a match and frees its participants.
    pub fn remove(&mut self, id: &MatchId) -> Option<ActiveMatch> {
        let active = self.matches.remove(id)?;
        for participant in active.participants() {
            self.participant_matches.remove(&participant);
        }
        tracing::info!(match_id = %id, "match removed");
        Some(active)
    }

    pub fn get(&self, id: &MatchId) -> Option<&ActiveMatch> {
        self.matches.get(id)
    }

    pub fn get_mut(&mut self, id: &MatchId) -> Option<&mut ActiveMatch> {
        self.matches.get_mut(id)
    }

    /// The id of the match `participant` is playing in.
    pub fn match_of(&self, participant: ParticipantId) -> Option<&MatchId> {
        self.participant_matches.get(&participant)
    }

    /// The match `participant` is playing in.
    pub fn find_by_participant(&self, participant: ParticipantId) -> Option<&ActiveMatch> {
        self.match_of(participant).and_then(|id| self.matches.get(id))
    }

    pub fn contains_participant(&self, participant: ParticipantId) -> bool {
        self.participant_matches.contains_key(&participant)
    }

    pub fn ids(&self) -> impl Iterator<Item = &MatchId> {
        self.matches.keys()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use arenalink_protocol::QueueKind;

    use super::*;
    use crate::ArenaHandle;

    fn make(id: &str, a: ParticipantId, b: ParticipantId) -> ActiveMatch {
        ActiveMatch::new(
            MatchId::from(id),
            [a, b],
            QueueKind::Casual,
            ArenaHandle(format!("arena-{id}")),
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_indexes_both_participants() {
        let mut reg = MatchRegistry::new();
        let (a, b) = (ParticipantId::new_v4(), ParticipantId::new_v4());

        reg.insert(make("m1", a, b)).unwrap();

        assert_eq!(reg.match_of(a), Some(&MatchId::from("m1")));
        assert_eq!(reg.match_of(b), Some(&MatchId::from("m1")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_insert_ghost_assignment_rejected_and_existing_untouched() {
        let mut reg = MatchRegistry::new();
        let (a, b, c) = (
            ParticipantId::new_v4(),
            ParticipantId::new_v4(),
            ParticipantId::new_v4(),
        );
        reg.insert(make("m1", a, b)).unwrap();
        reg.get_mut(&MatchId::from("m1"))
            .unwrap()
            .begin_round()
            .unwrap();

        let err = reg.insert(make("m2", c, b)).unwrap_err();

        assert_eq!(err, MatchError::DuplicateAssignment(b));
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains_participant(c));
        assert_eq!(reg.find_by_participant(b).unwrap().round(), 1);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let mut reg = MatchRegistry::new();
        reg.insert(make("m1", ParticipantId::new_v4(), ParticipantId::new_v4()))
            .unwrap();
        let (c, d) = (ParticipantId::new_v4(), ParticipantId::new_v4());

        let err = reg.insert(make("m1", c, d)).unwrap_err();

        assert_eq!(err, MatchError::AlreadyExists(MatchId::from("m1")));
        assert!(!reg.contains_participant(c));
    }

    #[test]
    fn test_remove_frees_participants() {
        let mut reg = MatchRegistry::new();
        let (a, b) = (ParticipantId::new_v4(), ParticipantId::new_v4());
        reg.insert(make("m1", a, b)).unwrap();

        assert!(reg.remove(&MatchId::from("m1")).is_some());
        assert!(reg.remove(&MatchId::from("m1")).is_none());
        assert!(!reg.contains_participant(a));
        assert!(!reg.contains_participant(b));
        assert!(reg.is_empty());
    }
}

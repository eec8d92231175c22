//! Integration tests for the round state machine driven through the
//! registry, the way the coordinator drives it.

use arenalink_match::{
    ActiveMatch, ArenaHandle, MatchError, MatchPhase, MatchRegistry, RoundEndTrigger,
};
use arenalink_protocol::{MatchId, ParticipantId, QueueKind};

// =========================================================================
// Helpers
// =========================================================================

fn setup(kind: QueueKind) -> (MatchRegistry, MatchId, ParticipantId, ParticipantId) {
    let mut reg = MatchRegistry::new();
    let a = ParticipantId::new_v4();
    let b = ParticipantId::new_v4();
    let id = MatchId::from("match-under-test");
    let active =
        ActiveMatch::new(id.clone(), [a, b], kind, ArenaHandle("arena-7".into()), 3).unwrap();
    reg.insert(active).unwrap();
    (reg, id, a, b)
}

fn play_round(reg: &mut MatchRegistry, id: &MatchId, trigger: RoundEndTrigger) -> bool {
    let m = reg.get_mut(id).unwrap();
    m.begin_round().unwrap();
    m.end_round(trigger).unwrap().match_over
}

// =========================================================================
// Full matches
// =========================================================================

#[test]
fn test_three_eliminations_end_match_with_result_in_assignment_order() {
    let (mut reg, id, a, b) = setup(QueueKind::Ranked);

    assert!(!play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: a }));
    assert!(!play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: a }));
    assert!(play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: a }));

    // Removed before anything else happens, so late events find nothing.
    let mut finished = reg.remove(&id).unwrap();
    assert!(!reg.contains_participant(a));
    assert!(reg.get_mut(&id).is_none());

    let result = finished.finish().unwrap();
    assert_eq!(result.participants, [a, b]);
    assert_eq!(result.rounds, [0, 3]);
    assert_eq!(result.winner(), Some(b));
    assert_eq!(result.kind, QueueKind::Ranked);
}

#[test]
fn test_scores_never_exceed_rounds_to_win() {
    let (mut reg, id, a, b) = setup(QueueKind::Casual);

    // 2-2 then a decider.
    play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: a });
    play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: b });
    play_round(&mut reg, &id, RoundEndTrigger::Timeout { health: [3.0, 9.0] });
    play_round(&mut reg, &id, RoundEndTrigger::Timeout { health: [9.0, 3.0] });
    assert!(play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: b }));

    let m = reg.get_mut(&id).unwrap();
    assert_eq!(m.scores(), [3, 2]);
    assert_eq!(m.round(), 5);

    // A duplicate trigger for the deciding round is discarded.
    let err = m
        .end_round(RoundEndTrigger::Elimination { eliminated: b })
        .unwrap_err();
    assert!(matches!(err, MatchError::RoundNotActive(_)));
    assert_eq!(m.scores(), [3, 2]);
}

#[test]
fn test_draws_advance_round_without_scoring() {
    let (mut reg, id, _, _) = setup(QueueKind::Ranked);

    for _ in 0..7 {
        assert!(!play_round(
            &mut reg,
            &id,
            RoundEndTrigger::Timeout { health: [20.0, 20.0] }
        ));
    }

    let m = reg.get(&id).unwrap();
    assert_eq!(m.scores(), [0, 0]);
    assert_eq!(m.round(), 7);
    assert_eq!(m.phase(), MatchPhase::RoundEnding { round: 7 });
}

#[test]
fn test_snapshot_reflects_live_state() {
    let (mut reg, id, a, b) = setup(QueueKind::Casual);
    play_round(&mut reg, &id, RoundEndTrigger::Elimination { eliminated: b });
    reg.get_mut(&id).unwrap().begin_round().unwrap();

    let snap = reg.find_by_participant(a).unwrap().snapshot();
    assert_eq!(snap.match_id, id);
    assert_eq!(snap.round, 2);
    assert_eq!(snap.scores, [1, 0]);
    assert_eq!(snap.phase, MatchPhase::RoundActive { round: 2 });
}

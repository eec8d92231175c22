//! The game world as the coordinator sees it.

use arenalink_match::{ArenaHandle, Position};
use arenalink_protocol::{ParticipantId, QueueKind};

use crate::Notice;

/// Everything the coordinator needs from the host game: presence,
/// messaging, vitals, positions, arenas and loadouts.
///
/// All methods are synchronous and only ever called from the coordinator
/// task, so implementations need no locking of their own. They must not
/// block; anything slow (loading an arena from disk, say) should be done
/// ahead of time.
pub trait World: Send + 'static {
    /// Whether the participant is connected to the game right now.
    fn is_online(&self, participant: ParticipantId) -> bool;

    /// Shows a notice to the participant. Offline participants may be
    /// ignored.
    fn notify(&mut self, participant: ParticipantId, notice: &Notice);

    /// Current health, or `None` if unknown (offline).
    fn health(&self, participant: ParticipantId) -> Option<f64>;

    /// Restores full health and clears status effects.
    fn reset_vitals(&mut self, participant: ParticipantId);

    /// Brings an eliminated participant back.
    fn respawn(&mut self, participant: ParticipantId);

    fn position(&self, participant: ParticipantId) -> Option<Position>;

    /// Moves the participant. Returns `false` if the position is unusable
    /// (its world no longer exists, for instance).
    fn teleport(&mut self, participant: ParticipantId, position: &Position) -> bool;

    /// Moves the participant to the default spawn.
    fn send_to_spawn(&mut self, participant: ParticipantId);

    /// Provisions an arena, or `None` if none is available.
    fn create_arena(&mut self, kind: QueueKind) -> Option<ArenaHandle>;

    /// Moves a participant to spawn slot 0 or 1 of an arena.
    fn teleport_to_slot(&mut self, arena: &ArenaHandle, slot: usize, participant: ParticipantId);

    fn release_arena(&mut self, arena: ArenaHandle);

    /// Equips the match loadout for `kind`.
    fn apply_loadout(&mut self, participant: ParticipantId, kind: QueueKind);

    fn clear_loadout(&mut self, participant: ParticipantId);
}

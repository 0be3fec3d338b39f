//! BattleTracker - replay state for one battle log

use usage_protocol::{GameType, Player};

use crate::error::StructuralError;
use crate::types::SideState;

/// Where the tracker is in the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No Pokemon sent out yet
    NotStarted,
    InProgress,
    /// `win` or `tie` seen
    Ended,
}

/// An open matchup between two active Pokemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OpenEncounter {
    /// Side index of the subject
    pub side: usize,
    pub subject: usize,
    pub opponent: usize,
}

/// A battle being replayed from its log
///
/// Reconstructs both sides from the partially observed event stream: who was
/// brought, what each Pokemon revealed, who led, and which matchups ended in
/// a knockout or a switch. Feed events through [`BattleTracker::apply`] and
/// take the result with [`BattleTracker::finish`].
#[derive(Debug, Clone)]
pub struct BattleTracker {
    pub phase: Phase,

    /// Tier id from the log's `tier` line
    pub tier: Option<String>,

    pub game_type: GameType,

    /// Current turn number (0 = not started)
    pub turn: u32,

    /// p1 and p2
    pub(crate) sides: [SideState; 2],

    pub(crate) open: Vec<OpenEncounter>,

    /// (side, roster index) of Pokemon fainted by the action being resolved
    pub(crate) recent_faints: Vec<(usize, usize)>,

    /// Username from the `win` line; `None` for a tie
    pub(crate) winner: Option<String>,

    /// Username of the player who forfeited
    pub(crate) forfeited: Option<String>,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            tier: None,
            game_type: GameType::Singles,
            turn: 0,
            sides: [SideState::new(Player::P1), SideState::new(Player::P2)],
            open: Vec::new(),
            recent_faints: Vec::new(),
            winner: None,
            forfeited: None,
        }
    }

    /// Get a side by player
    pub fn side(&self, player: Player) -> Option<&SideState> {
        side_index(player).ok().map(|idx| &self.sides[idx])
    }

    /// Set game type and update active slots accordingly
    pub fn set_game_type(&mut self, game_type: GameType) {
        self.game_type = game_type;
        for side in &mut self.sides {
            side.set_active_slots(game_type.active_slots());
        }
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Player whose username matches `name`
    pub(crate) fn player_named(&self, name: &str) -> Option<Player> {
        let name = usage_protocol::to_id(name);
        self.sides
            .iter()
            .find(|side| {
                side.username
                    .as_deref()
                    .is_some_and(|u| usage_protocol::to_id(u) == name)
            })
            .map(|side| side.player)
    }
}

impl Default for BattleTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Side index for a player; only two-player battles are tracked
pub fn side_index(player: Player) -> Result<usize, StructuralError> {
    match player {
        Player::P1 => Ok(0),
        Player::P2 => Ok(1),
        other => Err(StructuralError::UnsupportedSide(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker() {
        let tracker = BattleTracker::new();
        assert_eq!(tracker.phase, Phase::NotStarted);
        assert_eq!(tracker.turn, 0);
        assert_eq!(tracker.tier, None);
        assert_eq!(tracker.game_type, GameType::Singles);
        assert!(!tracker.is_ended());
    }

    #[test]
    fn test_set_game_type() {
        let mut tracker = BattleTracker::new();

        tracker.set_game_type(GameType::Doubles);
        assert_eq!(tracker.side(Player::P1).unwrap().active_slots(), 2);
        assert_eq!(tracker.side(Player::P2).unwrap().active_slots(), 2);

        tracker.set_game_type(GameType::Triples);
        assert_eq!(tracker.side(Player::P1).unwrap().active_slots(), 3);
    }

    #[test]
    fn test_side_index() {
        assert_eq!(side_index(Player::P1), Ok(0));
        assert_eq!(side_index(Player::P2), Ok(1));
        assert_eq!(
            side_index(Player::P3),
            Err(StructuralError::UnsupportedSide(Player::P3))
        );
        assert!(BattleTracker::new().side(Player::P4).is_none());
    }

    #[test]
    fn test_player_named() {
        let mut tracker = BattleTracker::new();
        tracker.sides[0].username = Some("Ash Ketchum".to_string());
        tracker.sides[1].username = Some("Gary".to_string());

        assert_eq!(tracker.player_named("ash ketchum"), Some(Player::P1));
        assert_eq!(tracker.player_named("Gary"), Some(Player::P2));
        assert_eq!(tracker.player_named("Brock"), None);
    }
}

//! Side (player) state

use usage_protocol::Player;

use super::pokemon::PokemonInstance;
use super::record::{Encounter, Lead, SideRecord};
use crate::error::{MAX_ROSTER, StructuralError};

/// One player's side while the battle is being replayed
#[derive(Debug, Clone)]
pub struct SideState {
    pub player: Player,

    pub username: Option<String>,

    pub rating: Option<i32>,

    /// Pokemon in first-seen order
    pub roster: Vec<PokemonInstance>,

    /// Roster index in each active slot
    /// For singles: [Some(idx)] or [None]
    pub active_indices: Vec<Option<usize>>,

    pub lead: Option<Lead>,

    /// Closed encounters whose subject is on this side
    pub encounters: Vec<Encounter>,
}

impl SideState {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            username: None,
            rating: None,
            roster: Vec::new(),
            active_indices: vec![None], // Default to singles
            lead: None,
            encounters: Vec::new(),
        }
    }

    /// Set the number of active slots (1 for singles, 2 for doubles, etc.)
    pub fn set_active_slots(&mut self, count: usize) {
        self.active_indices.resize(count, None);
    }

    pub fn active_slots(&self) -> usize {
        self.active_indices.len()
    }

    /// Roster index of the Pokemon in a slot
    pub fn active(&self, slot: usize) -> Option<usize> {
        self.active_indices.get(slot).copied().flatten()
    }

    /// Roster indices of every active Pokemon
    pub fn active_roster(&self) -> impl Iterator<Item = usize> + '_ {
        self.active_indices.iter().filter_map(|idx| *idx)
    }

    /// Slot a roster member currently occupies
    pub fn slot_of(&self, index: usize) -> Option<usize> {
        self.active_indices.iter().position(|idx| *idx == Some(index))
    }

    pub fn set_active(&mut self, slot: usize, index: Option<usize>) {
        if let Some(entry) = self.active_indices.get_mut(slot) {
            *entry = index;
        }
    }

    pub fn check_slot(&self, slot: usize) -> Result<(), StructuralError> {
        if slot >= self.active_slots() {
            return Err(StructuralError::SlotOutOfRange {
                slot,
                active_slots: self.active_slots(),
            });
        }
        Ok(())
    }

    /// Find a Pokemon by nickname
    pub fn find_pokemon(&self, nickname: &str) -> Option<usize> {
        self.roster.iter().position(|p| p.nickname == nickname)
    }

    /// Add a newly seen Pokemon, returning its roster index
    pub fn add_pokemon(&mut self, pokemon: PokemonInstance) -> Result<usize, StructuralError> {
        if self.roster.len() >= MAX_ROSTER {
            return Err(StructuralError::RosterOverflow(self.player));
        }
        self.roster.push(pokemon);
        Ok(self.roster.len() - 1)
    }

    pub fn into_record(self) -> SideRecord {
        SideRecord {
            player: self.player,
            username: self.username,
            rating: self.rating,
            roster: self.roster,
            lead: self.lead,
            encounters: self.encounters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usage_protocol::SpeciesRef;

    fn pokemon(name: &str) -> PokemonInstance {
        PokemonInstance::new(name, SpeciesRef::base(name.to_lowercase()), None)
    }

    #[test]
    fn test_side_state_new() {
        let side = SideState::new(Player::P1);
        assert_eq!(side.player, Player::P1);
        assert_eq!(side.active_slots(), 1);
        assert!(side.roster.is_empty());
        assert_eq!(side.lead, None);
    }

    #[test]
    fn test_set_active_slots() {
        let mut side = SideState::new(Player::P1);
        side.set_active_slots(2);
        assert_eq!(side.active_indices.len(), 2);
        assert!(side.check_slot(1).is_ok());
        assert_eq!(
            side.check_slot(2),
            Err(StructuralError::SlotOutOfRange {
                slot: 2,
                active_slots: 2
            })
        );
    }

    #[test]
    fn test_active_tracking() {
        let mut side = SideState::new(Player::P2);
        side.set_active_slots(2);
        let a = side.add_pokemon(pokemon("Pikachu")).unwrap();
        let b = side.add_pokemon(pokemon("Snorlax")).unwrap();

        side.set_active(0, Some(b));
        side.set_active(1, Some(a));

        assert_eq!(side.active(0), Some(b));
        assert_eq!(side.slot_of(a), Some(1));
        assert_eq!(side.active_roster().collect::<Vec<_>>(), vec![b, a]);

        side.set_active(0, None);
        assert_eq!(side.active(0), None);
        assert_eq!(side.slot_of(b), None);
    }

    #[test]
    fn test_find_pokemon() {
        let mut side = SideState::new(Player::P1);
        side.add_pokemon(pokemon("Pikachu")).unwrap();
        side.add_pokemon(pokemon("Snorlax")).unwrap();

        assert_eq!(side.find_pokemon("Snorlax"), Some(1));
        assert_eq!(side.find_pokemon("Mew"), None);
    }

    #[test]
    fn test_roster_overflow() {
        let mut side = SideState::new(Player::P1);
        for name in ["A", "B", "C", "D", "E", "F"] {
            side.add_pokemon(pokemon(name)).unwrap();
        }
        assert_eq!(
            side.add_pokemon(pokemon("G")),
            Err(StructuralError::RosterOverflow(Player::P1))
        );
    }
}

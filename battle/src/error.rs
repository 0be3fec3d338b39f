//! Errors raised while replaying a battle

use thiserror::Error;
use usage_protocol::{DecodeError, Player};

/// Maximum number of Pokemon a side may bring
pub const MAX_ROSTER: usize = 6;

/// The log describes a battle that cannot be reconstructed
///
/// Any of these abandons the whole battle; nothing from it is folded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("unsupported side {0}")]
    UnsupportedSide(Player),

    #[error("slot {slot} out of range for {active_slots} active slot(s)")]
    SlotOutOfRange { slot: usize, active_slots: usize },

    #[error("{0} roster exceeds 6 pokemon")]
    RosterOverflow(Player),

    #[error("unknown pokemon {nickname:?} on {player}")]
    UnknownPokemon { player: Player, nickname: String },

    #[error("{0} never sent out a pokemon")]
    EmptyRoster(Player),

    #[error("battle never ended")]
    Incomplete,
}

impl StructuralError {
    pub fn label(&self) -> &'static str {
        match self {
            StructuralError::UnsupportedSide(_) => "unsupported_side",
            StructuralError::SlotOutOfRange { .. } => "slot_out_of_range",
            StructuralError::RosterOverflow(_) => "roster_overflow",
            StructuralError::UnknownPokemon { .. } => "unknown_pokemon",
            StructuralError::EmptyRoster(_) => "empty_roster",
            StructuralError::Incomplete => "incomplete",
        }
    }
}

/// Why replaying a log failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

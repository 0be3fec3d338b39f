//! Replay domain types

mod pokemon;
mod record;
mod side;

pub use pokemon::{FormeRecord, MAX_MOVES, PokemonInstance};
pub use record::{BattleRecord, Encounter, EncounterOutcome, Lead, Outcome, SideRecord, SideView};
pub use side::SideState;

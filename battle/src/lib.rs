//! Battle replay for Pokemon Showdown usage statistics.
//!
//! Rebuilds what each side brought and revealed from a decoded battle log.
//!
//! # Overview
//!
//! ```text
//! usage-protocol (log lines -> BattleEvent)
//!        │
//!        ▼
//! usage-battle (BattleTracker -> BattleRecord)  ← THIS CRATE
//!        │
//!        ▼
//! usage-stats (weighting + aggregation)
//! ```
//!
//! # Main Types
//!
//! - [`BattleTracker`] - applies events one at a time and tracks the phase
//! - [`BattleRecord`] - the finished battle: tier, outcome, both sides
//! - [`PokemonInstance`] - one Pokemon with a [`FormeRecord`] per permanent forme
//! - [`Encounter`] - a closed matchup between two active Pokemon
//! - [`SideView`] - one side plus the roster it faced, ready to fold
//!
//! # Example Usage
//!
//! ```ignore
//! use usage_battle::replay;
//! use usage_protocol::Dex;
//!
//! let dex = Dex::load("dex.json")?;
//! let record = replay(&log_text, &dex, false)?;
//!
//! for view in record.side_views() {
//!     for poke in view.roster() {
//!         println!("{} brought {}", view.player(), poke.usage_key());
//!     }
//! }
//! ```

pub mod error;
pub mod tracking;
pub mod types;

pub use error::{MAX_ROSTER, StructuralError, TrackError};
pub use tracking::{BattleTracker, Phase, replay};
pub use types::{
    BattleRecord, Encounter, EncounterOutcome, FormeRecord, Lead, MAX_MOVES, Outcome,
    PokemonInstance, SideRecord, SideState, SideView,
};

// Re-export commonly used protocol types
pub use usage_protocol::{GameType, Player, SpeciesRef};

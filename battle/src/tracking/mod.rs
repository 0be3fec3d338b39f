//! Battle state tracking from decoded log events

mod battle;
mod replay;
mod updater;

pub use battle::{BattleTracker, Phase, side_index};
pub use replay::replay;

//! Weighted usage statistics for Pokemon Showdown battles.
//!
//! Takes replayed [`usage_battle::BattleRecord`]s, weighs each side by its
//! player's rating ([`WeightingPolicy`]) and folds it into per-tier tallies
//! ([`AggregateStore`]). Stores built by separate workers combine with
//! [`AggregateStore::merge`]; [`AggregateStore::snapshot`] hands the result
//! off as a plain nested mapping.

pub mod aggregate;
pub mod snapshot;
pub mod weighting;

pub use aggregate::{AggregateStore, AggregationError, MatchupTally, NestedTally, TierTally};
pub use snapshot::{KEY_SEPARATOR, Snapshot};
pub use weighting::{DecayCurve, WeightingError, WeightingPolicy, gxe, victory_chance};

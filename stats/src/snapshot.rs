//! Plain nested view of the aggregates for storage and reporting

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateStore, NestedTally, TierTally};

/// Joins the parts of a compound key (`species:move set`, `slot:species`, ...)
pub const KEY_SEPARATOR: &str = ":";

/// tier -> statistic kind -> key -> weighted value
///
/// Kinds are `totals`, `usage`, `leads`, `movesets`, `abilities`, `items`,
/// `teammates`, `checks.knocked_out`, `checks.switched_out` and
/// `checks.survived`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>);

impl Snapshot {
    pub fn get(&self, tier: &str, kind: &str, key: &str) -> Option<f64> {
        self.0.get(tier)?.get(kind)?.get(key).copied()
    }

    pub fn kind(&self, tier: &str, kind: &str) -> Option<&BTreeMap<String, f64>> {
        self.0.get(tier)?.get(kind)
    }

    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn compound(outer: &str, inner: &str) -> String {
    format!("{outer}{KEY_SEPARATOR}{inner}")
}

fn flatten(nested: &NestedTally) -> BTreeMap<String, f64> {
    nested
        .iter()
        .flat_map(|(outer, inner)| {
            inner
                .iter()
                .map(move |(key, value)| (compound(outer, key), *value))
        })
        .collect()
}

fn tier_snapshot(tally: &TierTally) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut kinds = BTreeMap::new();

    kinds.insert(
        "totals".to_string(),
        BTreeMap::from([
            ("sides".to_string(), tally.sides as f64),
            ("weight".to_string(), tally.total_weight),
        ]),
    );
    kinds.insert("usage".to_string(), tally.usage.clone());

    let leads = tally
        .leads
        .iter()
        .flat_map(|(slot, species)| {
            species
                .iter()
                .map(move |(key, value)| (compound(&slot.to_string(), key), *value))
        })
        .collect();
    kinds.insert("leads".to_string(), leads);

    kinds.insert("movesets".to_string(), flatten(&tally.movesets));
    kinds.insert("abilities".to_string(), flatten(&tally.abilities));
    kinds.insert("items".to_string(), flatten(&tally.items));
    kinds.insert("teammates".to_string(), flatten(&tally.teammates));

    let mut knocked_out = BTreeMap::new();
    let mut switched_out = BTreeMap::new();
    let mut survived = BTreeMap::new();
    for (species, opponents) in &tally.matchups {
        for (opponent, matchup) in opponents {
            let key = compound(species, opponent);
            knocked_out.insert(key.clone(), matchup.knocked_out);
            switched_out.insert(key.clone(), matchup.switched_out);
            survived.insert(key, matchup.survived);
        }
    }
    kinds.insert("checks.knocked_out".to_string(), knocked_out);
    kinds.insert("checks.switched_out".to_string(), switched_out);
    kinds.insert("checks.survived".to_string(), survived);

    kinds
}

impl AggregateStore {
    /// Read-only copy of every tally as a plain nested mapping
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(
            self.tiers()
                .map(|(tier, tally)| (tier.to_string(), tier_snapshot(tally)))
                .collect(),
        )
    }
}

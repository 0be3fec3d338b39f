//! Weighted usage tallies, partitioned by tier
//!
//! An [`AggregateStore`] only grows by [`AggregateStore::fold`] (one battle
//! side at a time) and [`AggregateStore::merge`] (another store's tallies).
//! It never deduplicates: folding the same side twice counts it twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use usage_battle::{EncounterOutcome, SideView};

/// A fold that would corrupt the tallies
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),

    #[error("cannot fold a side with an empty roster")]
    EmptyRoster,

    #[error("side has no lead in its roster")]
    MissingLead,
}

/// species -> key -> weight
pub type NestedTally = BTreeMap<String, BTreeMap<String, f64>>;

/// Outcomes of one species' encounters with one opponent species
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchupTally {
    /// The species fainted while the opponent was in
    pub knocked_out: f64,
    /// The species left the field while the opponent stayed
    pub switched_out: f64,
    /// Every encounter the species came out of without fainting
    pub survived: f64,
}

impl MatchupTally {
    fn add(&mut self, other: &MatchupTally) {
        self.knocked_out += other.knocked_out;
        self.switched_out += other.switched_out;
        self.survived += other.survived;
    }
}

/// All tallies for one tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTally {
    /// Number of sides folded
    pub sides: u64,

    /// Sum of folded weights, the denominator for usage percentages
    pub total_weight: f64,

    pub usage: BTreeMap<String, f64>,

    /// slot -> species -> weight
    pub leads: BTreeMap<usize, BTreeMap<String, f64>>,

    /// species -> canonical move set -> weight
    pub movesets: NestedTally,

    pub abilities: NestedTally,

    pub items: NestedTally,

    /// species -> teammate -> weight, stored in both directions
    pub teammates: NestedTally,

    /// species -> opponent species -> outcomes
    pub matchups: BTreeMap<String, BTreeMap<String, MatchupTally>>,
}

impl TierTally {
    fn fold(&mut self, view: &SideView<'_>, lead: (&str, usize), weight: f64) {
        self.sides += 1;
        self.total_weight += weight;

        let keys = view.side.usage_keys();
        for key in &keys {
            *self.usage.entry(key.to_string()).or_default() += weight;
        }

        let (lead_key, lead_slot) = lead;
        *self
            .leads
            .entry(lead_slot)
            .or_default()
            .entry(lead_key.to_string())
            .or_default() += weight;

        for poke in view.roster() {
            for record in &poke.formes {
                let species = &record.species.forme;
                if let Some(moves) = record.canonical_moves() {
                    add_nested(&mut self.movesets, species, &moves, weight);
                }
                if let Some(ability) = &record.ability {
                    add_nested(&mut self.abilities, species, ability, weight);
                }
                if let Some(item) = &record.item {
                    add_nested(&mut self.items, species, item, weight);
                }
            }
        }

        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                add_nested(&mut self.teammates, a, b, weight);
                add_nested(&mut self.teammates, b, a, weight);
            }
        }

        for (subject, opponent, outcome) in view.encounters() {
            let tally = self
                .matchups
                .entry(subject.usage_key().to_string())
                .or_default()
                .entry(opponent.usage_key().to_string())
                .or_default();
            match outcome {
                EncounterOutcome::KnockedOut => tally.knocked_out += weight,
                EncounterOutcome::SwitchedOut => {
                    tally.switched_out += weight;
                    tally.survived += weight;
                }
                EncounterOutcome::Neutral => tally.survived += weight,
            }
        }
    }

    fn merge(&mut self, other: TierTally) {
        self.sides += other.sides;
        self.total_weight += other.total_weight;

        for (key, value) in other.usage {
            *self.usage.entry(key).or_default() += value;
        }
        for (slot, species) in other.leads {
            merge_flat(self.leads.entry(slot).or_default(), species);
        }
        merge_nested(&mut self.movesets, other.movesets);
        merge_nested(&mut self.abilities, other.abilities);
        merge_nested(&mut self.items, other.items);
        merge_nested(&mut self.teammates, other.teammates);

        for (species, opponents) in other.matchups {
            let mine = self.matchups.entry(species).or_default();
            for (opponent, tally) in opponents {
                mine.entry(opponent).or_default().add(&tally);
            }
        }
    }
}

fn add_nested(map: &mut NestedTally, outer: &str, inner: &str, weight: f64) {
    *map.entry(outer.to_string())
        .or_default()
        .entry(inner.to_string())
        .or_default() += weight;
}

fn merge_flat(into: &mut BTreeMap<String, f64>, from: BTreeMap<String, f64>) {
    for (key, value) in from {
        *into.entry(key).or_default() += value;
    }
}

fn merge_nested(into: &mut NestedTally, from: NestedTally) {
    for (outer, inner) in from {
        merge_flat(into.entry(outer).or_default(), inner);
    }
}

/// Weighted tallies for every tier seen so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStore {
    tiers: BTreeMap<String, TierTally>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one battle side into its tier
    ///
    /// The side is checked before anything is touched, so a rejected fold
    /// leaves the store unchanged.
    pub fn fold(
        &mut self,
        tier: &str,
        view: SideView<'_>,
        weight: f64,
    ) -> Result<(), AggregationError> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(AggregationError::InvalidWeight(weight));
        }
        if view.roster().is_empty() {
            return Err(AggregationError::EmptyRoster);
        }
        let (lead, slot) = view.lead().ok_or(AggregationError::MissingLead)?;

        tracing::trace!(
            tier,
            player = %view.player(),
            weight,
            roster = view.roster().len(),
            "folding side"
        );

        self.tiers
            .entry(tier.to_string())
            .or_default()
            .fold(&view, (lead.usage_key(), slot), weight);
        Ok(())
    }

    /// Add another store's tallies into this one
    pub fn merge(&mut self, other: AggregateStore) {
        for (tier, tally) in other.tiers {
            self.tiers.entry(tier).or_default().merge(tally);
        }
    }

    pub fn tier(&self, tier: &str) -> Option<&TierTally> {
        self.tiers.get(tier)
    }

    pub fn tiers(&self) -> impl Iterator<Item = (&str, &TierTally)> {
        self.tiers.iter().map(|(name, tally)| (name.as_str(), tally))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Total number of sides folded across all tiers
    pub fn sides_folded(&self) -> u64 {
        self.tiers.values().map(|t| t.sides).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usage_battle::{BattleRecord, replay};
    use usage_protocol::Dex;

    fn dex() -> Dex {
        Dex::new()
            .with_species("Pikachu", None)
            .with_species("Charizard", None)
            .with_species("Charizard-Mega-X", Some("Charizard"))
            .with_species("Snorlax", None)
            .with_species("Gengar", None)
            .with_species("Ferrothorn", None)
            .with_moves(&[
                "Thunderbolt",
                "Volt Switch",
                "Dragon Dance",
                "Flare Blitz",
                "Body Slam",
                "Curse",
            ])
            .with_abilities(&["Static", "Blaze", "Tough Claws", "Thick Fat"])
            .with_items(&["Light Ball", "Charizardite X", "Leftovers"])
    }

    fn battle(log: &str) -> BattleRecord {
        let log: String = log.lines().map(|l| format!("{}\n", l.trim())).collect();
        replay(&log, &dex(), false).unwrap()
    }

    fn fold_both(store: &mut AggregateStore, record: &BattleRecord, weight: f64) {
        for view in record.side_views() {
            store.fold("gen7ou", view, weight).unwrap();
        }
    }

    const MINIMAL: &str = "
        |player|p1|Alice|1|1500
        |player|p2|Bob|2|1500
        |switch|p1a: Pikachu|Pikachu|100/100
        |switch|p2a: Charizard|Charizard|100/100
        |win|Alice";

    const FULL: &str = "
        |switch|p1a: Sparky|Pikachu|100/100
        |switch|p2a: Snorlax|Snorlax|100/100
        |move|p1a: Sparky|Volt Switch|p2a: Snorlax
        |-item|p1a: Sparky|Light Ball
        |switch|p1a: Gengar|Gengar|100/100
        |move|p2a: Snorlax|Body Slam|p1a: Gengar
        |-ability|p2a: Snorlax|Thick Fat
        |switch|p1a: Ferrothorn|Ferrothorn|100/100
        |move|p2a: Snorlax|Curse|p2a: Snorlax
        |move|p2a: Snorlax|Body Slam|p1a: Ferrothorn
        |faint|p1a: Ferrothorn
        |switch|p1a: Sparky|Pikachu|100/100
        |move|p1a: Sparky|Thunderbolt|p2a: Snorlax
        |faint|p2a: Snorlax
        |win|Alice";

    #[test]
    fn test_minimal_battle() {
        let record = battle(MINIMAL);
        let mut store = AggregateStore::new();
        fold_both(&mut store, &record, 1.0);

        let tier = store.tier("gen7ou").unwrap();
        assert_eq!(tier.sides, 2);
        assert_eq!(tier.total_weight, 2.0);
        assert_eq!(tier.usage["pikachu"], 1.0);
        assert_eq!(tier.usage["charizard"], 1.0);
        assert_eq!(tier.leads[&0]["pikachu"], 1.0);
        assert_eq!(tier.leads[&0]["charizard"], 1.0);
        assert!(tier.movesets.is_empty());
        assert!(tier.abilities.is_empty());
        assert!(tier.items.is_empty());
        assert!(tier.teammates.is_empty());
        assert!(tier.matchups.is_empty());
    }

    #[test]
    fn test_full_battle() {
        let record = battle(FULL);
        let mut store = AggregateStore::new();
        fold_both(&mut store, &record, 1.0);
        let tier = store.tier("gen7ou").unwrap();

        assert_eq!(tier.usage.len(), 4);
        assert_eq!(tier.movesets["pikachu"]["thunderbolt,voltswitch"], 1.0);
        assert_eq!(tier.movesets["snorlax"]["bodyslam,curse"], 1.0);
        assert!(!tier.movesets.contains_key("gengar"));
        assert_eq!(tier.items["pikachu"]["lightball"], 1.0);
        assert_eq!(tier.abilities["snorlax"]["thickfat"], 1.0);

        // Pikachu, Gengar, Ferrothorn: three pairs, both directions
        assert_eq!(tier.teammates["pikachu"].len(), 2);
        assert_eq!(tier.teammates["gengar"]["ferrothorn"], 1.0);
        assert_eq!(tier.teammates["ferrothorn"]["gengar"], 1.0);
        assert!(!tier.teammates.contains_key("snorlax"));

        let ferro_vs_lax = tier.matchups["ferrothorn"]["snorlax"];
        assert_eq!(ferro_vs_lax.knocked_out, 1.0);
        assert_eq!(ferro_vs_lax.survived, 0.0);

        let lax_vs_pika = tier.matchups["snorlax"]["pikachu"];
        // Pikachu left once (neutral for Snorlax), then knocked it out
        assert_eq!(lax_vs_pika.knocked_out, 1.0);
        assert_eq!(lax_vs_pika.survived, 1.0);

        let pika_vs_lax = tier.matchups["pikachu"]["snorlax"];
        assert_eq!(pika_vs_lax.switched_out, 1.0);
        assert_eq!(pika_vs_lax.survived, 2.0);
    }

    #[test]
    fn test_mega_moves_stay_under_base_forme() {
        let record = battle(
            "|switch|p1a: Charizard|Charizard|100/100
            |switch|p2a: Snorlax|Snorlax|100/100
            |move|p1a: Charizard|Dragon Dance|p1a: Charizard
            |-ability|p1a: Charizard|Blaze
            |-mega|p1a: Charizard|Charizard|Charizardite X
            |detailschange|p1a: Charizard|Charizard-Mega-X
            |move|p1a: Charizard|Flare Blitz|p2a: Snorlax
            |win|Alice",
        );
        let mut store = AggregateStore::new();
        fold_both(&mut store, &record, 1.0);
        let tier = store.tier("gen7ou").unwrap();

        assert_eq!(tier.usage.get("charizard"), None);
        assert_eq!(tier.usage["charizardmegax"], 1.0);
        assert_eq!(tier.leads[&0]["charizardmegax"], 1.0);
        assert_eq!(tier.movesets["charizard"]["dragondance"], 1.0);
        assert_eq!(tier.abilities["charizard"]["blaze"], 1.0);
        assert_eq!(tier.movesets["charizardmegax"]["flareblitz"], 1.0);
        assert!(!tier.abilities.contains_key("charizardmegax"));
        assert_eq!(tier.items["charizardmegax"]["charizarditex"], 1.0);
    }

    #[test]
    fn test_weight_scales_everything() {
        let record = battle(FULL);
        let mut store = AggregateStore::new();
        fold_both(&mut store, &record, 0.25);
        let tier = store.tier("gen7ou").unwrap();

        assert_eq!(tier.total_weight, 0.5);
        assert_eq!(tier.usage["pikachu"], 0.25);
        assert_eq!(tier.teammates["pikachu"]["gengar"], 0.25);
        assert_eq!(tier.matchups["ferrothorn"]["snorlax"].knocked_out, 0.25);
    }

    #[test]
    fn test_usage_sum_matches_roster_sizes() {
        let mut store = AggregateStore::new();
        let records = [battle(MINIMAL), battle(FULL)];
        let weights = [1.0, 0.5];
        let mut expected = 0.0;
        for (record, weight) in records.iter().zip(weights) {
            fold_both(&mut store, record, weight);
            for side in &record.sides {
                expected += weight * side.usage_keys().len() as f64;
            }
        }

        let tier = store.tier("gen7ou").unwrap();
        let total: f64 = tier.usage.values().sum();
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_teammates_symmetric_and_pair_count() {
        let record = battle(FULL);
        let mut store = AggregateStore::new();
        let view = record.side_views()[0];
        store.fold("gen7ou", view, 1.0).unwrap();
        let tier = store.tier("gen7ou").unwrap();

        for (a, mates) in &tier.teammates {
            for (b, weight) in mates {
                assert_eq!(tier.teammates[b][a], *weight);
            }
        }
        let n = view.side.usage_keys().len();
        let directed: usize = tier.teammates.values().map(|m| m.len()).sum();
        assert_eq!(directed, n * (n - 1));
    }

    #[test]
    fn test_leads_sum_to_sides() {
        let mut store = AggregateStore::new();
        for _ in 0..3 {
            fold_both(&mut store, &battle(MINIMAL), 1.0);
        }
        fold_both(&mut store, &battle(FULL), 1.0);

        let tier = store.tier("gen7ou").unwrap();
        let leads: f64 = tier.leads.values().flat_map(|m| m.values()).sum();
        assert_eq!(leads, tier.sides as f64);
        assert_eq!(tier.sides, 8);
    }

    #[test]
    fn test_no_dedup_across_folds() {
        let record = battle(MINIMAL);
        let mut store = AggregateStore::new();
        fold_both(&mut store, &record, 1.0);
        fold_both(&mut store, &record, 1.0);
        assert_eq!(store.tier("gen7ou").unwrap().usage["pikachu"], 2.0);
    }

    #[test]
    fn test_rejected_folds_leave_store_untouched() {
        let record = battle(MINIMAL);
        let view = record.side_views()[0];
        let mut store = AggregateStore::new();

        assert_eq!(
            store.fold("gen7ou", view, -1.0),
            Err(AggregationError::InvalidWeight(-1.0))
        );
        assert!(matches!(
            store.fold("gen7ou", view, f64::NAN),
            Err(AggregationError::InvalidWeight(_))
        ));

        let mut leaderless = record.sides[0].clone();
        leaderless.lead = None;
        let view = usage_battle::SideView {
            side: &leaderless,
            opponents: &record.sides[1].roster,
        };
        assert_eq!(
            store.fold("gen7ou", view, 1.0),
            Err(AggregationError::MissingLead)
        );

        let mut empty = record.sides[0].clone();
        empty.roster.clear();
        let view = usage_battle::SideView {
            side: &empty,
            opponents: &record.sides[1].roster,
        };
        assert_eq!(
            store.fold("gen7ou", view, 1.0),
            Err(AggregationError::EmptyRoster)
        );

        assert!(store.is_empty());
    }

    #[test]
    fn test_tiers_do_not_mix() {
        let record = battle(MINIMAL);
        let mut store = AggregateStore::new();
        let [p1, p2] = record.side_views();
        store.fold("gen7ou", p1, 1.0).unwrap();
        store.fold("gen7uu", p2, 1.0).unwrap();

        assert_eq!(store.tier("gen7ou").unwrap().usage.len(), 1);
        assert_eq!(store.tier("gen7uu").unwrap().usage["charizard"], 1.0);
        assert_eq!(store.sides_folded(), 2);
        assert_eq!(store.tiers().count(), 2);
    }

    #[test]
    fn test_merge_equals_sequential_fold() {
        let records = [battle(MINIMAL), battle(FULL), battle(MINIMAL)];

        let mut sequential = AggregateStore::new();
        for record in &records {
            fold_both(&mut sequential, record, 0.5);
        }

        let mut left = AggregateStore::new();
        fold_both(&mut left, &records[0], 0.5);
        let mut middle = AggregateStore::new();
        fold_both(&mut middle, &records[1], 0.5);
        let mut right = AggregateStore::new();
        fold_both(&mut right, &records[2], 0.5);

        // (right + middle) + left
        let mut merged = right;
        merged.merge(middle);
        merged.merge(left);
        assert_eq!(merged, sequential);

        let mut with_empty = sequential.clone();
        with_empty.merge(AggregateStore::new());
        assert_eq!(with_empty, sequential);
    }

    #[test]
    fn test_store_roundtrips_through_json() {
        let mut store = AggregateStore::new();
        fold_both(&mut store, &battle(FULL), 1.0);

        let json = serde_json::to_string(&store).unwrap();
        let restored: AggregateStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn test_glicko_weighted_sums_roundtrip_exactly() {
        let policy = crate::WeightingPolicy::default();
        let record = battle(FULL);
        let mut store = AggregateStore::new();
        for rating in (40..1500).step_by(7) {
            fold_both(&mut store, &record, policy.weight(Some(rating)));

            let json = serde_json::to_string(&store).unwrap();
            let restored: AggregateStore = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, store, "drift after rating {rating}");
        }
    }
}

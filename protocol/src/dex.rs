//! Dex vocabulary: the species, moves, abilities and items a run accepts.
//!
//! Every name that reaches the statistics is normalized to an id (lowercase
//! ASCII alphanumerics) and must resolve here. The dex is loaded once per run
//! and shared read-only between workers.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Category, DecodeErrorKind};

/// Errors loading a dex file
#[derive(Error, Debug)]
pub enum DexError {
    #[error("failed to read dex file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse dex: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Strip everything but ASCII alphanumerics and lowercase the rest
///
/// `"Charizard-Mega-X"` becomes `"charizardmegax"`, `"[Gen 7] OU"` becomes `"gen7ou"`.
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A species as a (base species, forme) pair of ids
///
/// For a base forme both ids are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesRef {
    pub base: String,
    pub forme: String,
}

impl SpeciesRef {
    pub fn new(base: impl Into<String>, forme: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            forme: forme.into(),
        }
    }

    /// A species that is its own base forme
    pub fn base(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            base: id.clone(),
            forme: id,
        }
    }

    pub fn is_base_forme(&self) -> bool {
        self.base == self.forme
    }
}

/// One pokedex entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Display name (e.g. "Charizard-Mega-X")
    pub name: String,

    /// Display name of the base species, absent for base formes
    #[serde(default, rename = "baseSpecies")]
    pub base_species: Option<String>,
}

/// On-disk shape of a dex file; keys are display names or ids
#[derive(Debug, Default, Deserialize)]
struct RawDex {
    #[serde(default)]
    species: HashMap<String, SpeciesEntry>,
    #[serde(default)]
    aliases: HashMap<String, String>,
    #[serde(default)]
    moves: Vec<String>,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    items: Vec<String>,
}

/// Normalized vocabulary used to resolve log identifiers
#[derive(Debug, Clone, Default)]
pub struct Dex {
    species: HashMap<String, SpeciesEntry>,
    aliases: HashMap<String, String>,
    moves: HashSet<String>,
    abilities: HashSet<String>,
    items: HashSet<String>,
}

impl Dex {
    /// Create an empty dex (resolves nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dex from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, DexError> {
        let raw: RawDex = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Load a dex from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DexError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn from_raw(raw: RawDex) -> Self {
        let mut dex = Dex::new();
        for (key, entry) in raw.species {
            dex.species.insert(to_id(&key), entry);
        }
        for (alias, target) in raw.aliases {
            dex.aliases.insert(to_id(&alias), to_id(&target));
        }
        dex.moves = raw.moves.iter().map(|m| to_id(m)).collect();
        dex.abilities = raw.abilities.iter().map(|a| to_id(a)).collect();
        dex.items = raw.items.iter().map(|i| to_id(i)).collect();
        dex
    }

    /// Add a species, optionally as a forme of `base`
    pub fn with_species(mut self, name: &str, base: Option<&str>) -> Self {
        self.species.insert(
            to_id(name),
            SpeciesEntry {
                name: name.to_string(),
                base_species: base.map(str::to_string),
            },
        );
        self
    }

    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.insert(to_id(alias), to_id(target));
        self
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.moves.extend(moves.iter().map(|m| to_id(m)));
        self
    }

    pub fn with_abilities(mut self, abilities: &[&str]) -> Self {
        self.abilities.extend(abilities.iter().map(|a| to_id(a)));
        self
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items.extend(items.iter().map(|i| to_id(i)));
        self
    }

    /// Number of species entries
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Display name for a species id, if known
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.species.get(id).map(|e| e.name.as_str())
    }

    fn dealias(&self, id: String) -> String {
        match self.aliases.get(&id) {
            Some(target) => target.clone(),
            None => id,
        }
    }

    /// Resolve a species name from a log into its (base, forme) ids
    ///
    /// The `-*` suffix Showdown uses for hidden formes (`Arceus-*`) is dropped.
    pub fn resolve_species(&self, name: &str) -> Result<SpeciesRef, DecodeErrorKind> {
        let trimmed = name.trim();
        let trimmed = trimmed.strip_suffix("-*").unwrap_or(trimmed);
        let id = self.dealias(to_id(trimmed));

        let entry = self
            .species
            .get(&id)
            .ok_or_else(|| unresolved(Category::Species, name))?;

        let base = match &entry.base_species {
            Some(base) => self.dealias(to_id(base)),
            None => id.clone(),
        };

        Ok(SpeciesRef { base, forme: id })
    }

    pub fn resolve_move(&self, name: &str) -> Result<String, DecodeErrorKind> {
        self.resolve_in(&self.moves, Category::Move, name)
    }

    pub fn resolve_ability(&self, name: &str) -> Result<String, DecodeErrorKind> {
        self.resolve_in(&self.abilities, Category::Ability, name)
    }

    pub fn resolve_item(&self, name: &str) -> Result<String, DecodeErrorKind> {
        self.resolve_in(&self.items, Category::Item, name)
    }

    fn resolve_in(
        &self,
        vocabulary: &HashSet<String>,
        category: Category,
        name: &str,
    ) -> Result<String, DecodeErrorKind> {
        let id = self.dealias(to_id(name));
        if vocabulary.contains(&id) {
            Ok(id)
        } else {
            Err(unresolved(category, name))
        }
    }
}

fn unresolved(category: Category, name: &str) -> DecodeErrorKind {
    DecodeErrorKind::UnresolvedIdentifier {
        category,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dex() -> Dex {
        Dex::new()
            .with_species("Charizard", None)
            .with_species("Charizard-Mega-X", Some("Charizard"))
            .with_species("Arceus", None)
            .with_moves(&["Flamethrower", "Dragon Dance"])
            .with_abilities(&["Blaze", "Tough Claws"])
            .with_items(&["Charizardite X", "Leftovers"])
            .with_alias("Zard", "Charizard")
    }

    #[test]
    fn test_to_id() {
        assert_eq!(to_id("Charizard-Mega-X"), "charizardmegax");
        assert_eq!(to_id("[Gen 7] OU"), "gen7ou");
        assert_eq!(to_id("Farfetch’d"), "farfetchd");
    }

    #[test]
    fn test_resolve_base_species() {
        let dex = sample_dex();
        let species = dex.resolve_species("Charizard").unwrap();
        assert_eq!(species, SpeciesRef::base("charizard"));
        assert!(species.is_base_forme());
    }

    #[test]
    fn test_resolve_forme() {
        let dex = sample_dex();
        let species = dex.resolve_species("Charizard-Mega-X").unwrap();
        assert_eq!(species.base, "charizard");
        assert_eq!(species.forme, "charizardmegax");
        assert!(!species.is_base_forme());
    }

    #[test]
    fn test_resolve_wildcard_forme() {
        let dex = sample_dex();
        assert_eq!(
            dex.resolve_species("Arceus-*").unwrap(),
            SpeciesRef::base("arceus")
        );
    }

    #[test]
    fn test_resolve_alias() {
        let dex = sample_dex();
        assert_eq!(
            dex.resolve_species("zard").unwrap(),
            SpeciesRef::base("charizard")
        );
    }

    #[test]
    fn test_unresolved_species() {
        let dex = sample_dex();
        let err = dex.resolve_species("Missingno").unwrap_err();
        assert_eq!(
            err,
            DecodeErrorKind::UnresolvedIdentifier {
                category: Category::Species,
                name: "Missingno".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_move_ability_item() {
        let dex = sample_dex();
        assert_eq!(dex.resolve_move("Dragon Dance").unwrap(), "dragondance");
        assert_eq!(dex.resolve_ability("Tough Claws").unwrap(), "toughclaws");
        assert_eq!(dex.resolve_item("Charizardite X").unwrap(), "charizarditex");
        assert!(dex.resolve_move("Splash").is_err());
        assert!(dex.resolve_ability("Levitate").is_err());
        assert!(dex.resolve_item("Choice Band").is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "species": {
                "Venusaur": {"name": "Venusaur"},
                "Venusaur-Mega": {"name": "Venusaur-Mega", "baseSpecies": "Venusaur"}
            },
            "aliases": {"Saur": "Venusaur"},
            "moves": ["Giga Drain"],
            "abilities": ["Thick Fat"],
            "items": ["Venusaurite"]
        }"#;

        let dex = Dex::from_json(json).unwrap();
        assert_eq!(dex.species_count(), 2);
        assert_eq!(dex.display_name("venusaurmega"), Some("Venusaur-Mega"));
        assert_eq!(
            dex.resolve_species("Venusaur-Mega").unwrap(),
            SpeciesRef::new("venusaur", "venusaurmega")
        );
        assert_eq!(dex.resolve_species("saur").unwrap().forme, "venusaur");
        assert_eq!(dex.resolve_move("Giga Drain").unwrap(), "gigadrain");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            Dex::from_json("{not json"),
            Err(DexError::Parse(_))
        ));
    }
}

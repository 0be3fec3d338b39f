//! Shared types for battle log lines

use std::fmt;

use crate::DecodeErrorKind;
use crate::dex::{Dex, SpeciesRef};

/// Player in a battle (p1, p2, p3, p4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    P1,
    P2,
    P3,
    P4,
}

impl Player {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "p1" => Some(Player::P1),
            "p2" => Some(Player::P2),
            "p3" => Some(Player::P3),
            "p4" => Some(Player::P4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
            Player::P3 => "p3",
            Player::P4 => "p4",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pokemon identifier in the form "POSITION: NAME" (e.g., "p1a: Pikachu")
#[derive(Debug, Clone, PartialEq)]
pub struct PokemonRef {
    /// Player who owns this pokemon
    pub player: Player,
    /// Active slot (a = 0, b = 1, ...), or None when the ident has no position letter
    pub slot: Option<usize>,
    /// Pokemon's nickname as shown in the log
    pub nickname: String,
    /// The nickname resolved as a species, when it happens to be one
    pub species_hint: Option<SpeciesRef>,
}

impl PokemonRef {
    /// Parse a pokemon ID string like "p1a: Pikachu" or "p1: Pikachu"
    pub fn parse(s: &str) -> Option<Self> {
        let (pos_part, name) = s.trim().split_once(": ")?;

        let player = Player::parse(pos_part.get(..2)?)?;
        let slot = pos_part
            .chars()
            .nth(2)
            .filter(|c| c.is_ascii_lowercase())
            .map(|c| (c as u8 - b'a') as usize);

        if name.is_empty() {
            return None;
        }

        Some(PokemonRef {
            player,
            slot,
            nickname: name.to_string(),
            species_hint: None,
        })
    }

    /// Attach the species the nickname resolves to, if any
    pub fn with_hint(mut self, dex: &Dex) -> Self {
        self.species_hint = dex.resolve_species(&self.nickname).ok();
        self
    }
}

/// Pokemon details string; only species and level matter to usage counting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
}

impl PokemonDetails {
    /// Parse a details string like "Pikachu, L50, M, shiny" or "Arceus-*"
    pub fn parse(s: &str) -> Self {
        let mut details = PokemonDetails::default();
        let parts: Vec<&str> = s.split(", ").collect();

        if let Some(species) = parts.first() {
            details.species = species.trim().to_string();
        }

        for part in parts.iter().skip(1) {
            if let Some(level_str) = part.strip_prefix('L') {
                details.level = level_str.parse().ok();
            }
        }

        details
    }
}

/// Game type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Singles,
    Doubles,
    Triples,
    Multi,
    FreeForAll,
}

impl GameType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "singles" => Some(GameType::Singles),
            "doubles" => Some(GameType::Doubles),
            "triples" => Some(GameType::Triples),
            "multi" => Some(GameType::Multi),
            "freeforall" => Some(GameType::FreeForAll),
            _ => None,
        }
    }

    /// Number of simultaneously active Pokemon per side
    pub fn active_slots(&self) -> usize {
        match self {
            GameType::Singles => 1,
            GameType::Doubles => 2,
            GameType::Triples => 3,
            GameType::Multi => 2,
            GameType::FreeForAll => 1,
        }
    }
}

/// A decoded battle log line
///
/// Lines that carry nothing the statistics need (damage, boosts, chat, ...)
/// decode to [`BattleEvent::Unrecognized`] with their tag.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    /// A Pokemon entered the field (`switch` or `drag`)
    Switch {
        pokemon: PokemonRef,
        species: SpeciesRef,
        level: Option<u8>,
    },
    /// A Pokemon used one of its own moves
    Move { pokemon: PokemonRef, move_id: String },
    Faint(PokemonRef),
    AbilityReveal {
        pokemon: PokemonRef,
        ability: String,
        /// Ability the same line gives away for the `[of]` Pokemon
        also: Option<RevealedAbility>,
    },
    /// Held item seen; `None` once the item was removed by another effect
    ItemReveal {
        pokemon: PokemonRef,
        item: Option<String>,
        /// The ability that announced the item (Frisk, Pickup, ...) and its owner
        also: Option<RevealedAbility>,
    },
    /// `detailschange` (permanent, e.g. Mega Evolution) or `-formechange` (temporary)
    FormeChange {
        pokemon: PokemonRef,
        species: SpeciesRef,
        permanent: bool,
        /// Own ability that triggered the change (Stance Change, Zen Mode, ...)
        ability: Option<String>,
    },
    /// The Pokemon copied another; its moves are no longer its own until it leaves
    Transform {
        pokemon: PokemonRef,
        /// Own ability that triggered the copy (Imposter)
        ability: Option<String>,
    },
    RatingReport {
        player: Player,
        username: String,
        rating: Option<i32>,
    },
    /// Tier id (e.g. "gen7ou")
    TierTag(String),
    GameType(GameType),
    Turn(u32),
    Forfeit { username: String },
    /// `win` (with the winner's username) or `tie`
    BattleEnd { winner: Option<String> },
    Unrecognized(String),
}

impl BattleEvent {
    /// Whether the event changes tracked state
    pub fn is_recognized(&self) -> bool {
        !matches!(self, BattleEvent::Unrecognized(_))
    }
}

/// An ability revealed for a Pokemon other than the line's main subject
#[derive(Debug, Clone, PartialEq)]
pub struct RevealedAbility {
    pub pokemon: PokemonRef,
    pub ability: String,
}

pub(crate) fn malformed(what: &str) -> DecodeErrorKind {
    DecodeErrorKind::Malformed(what.to_string())
}

/// Helper to parse a PokemonRef from message parts
pub(crate) fn parse_pokemon(
    parts: &[&str],
    index: usize,
    dex: &Dex,
) -> Result<PokemonRef, DecodeErrorKind> {
    parts
        .get(index)
        .and_then(|s| PokemonRef::parse(s))
        .map(|p| p.with_hint(dex))
        .ok_or_else(|| malformed("pokemon"))
}

/// Helper to parse PokemonDetails from message parts
pub(crate) fn parse_details(
    parts: &[&str],
    index: usize,
) -> Result<PokemonDetails, DecodeErrorKind> {
    parts
        .get(index)
        .filter(|s| !s.trim().is_empty())
        .map(|s| PokemonDetails::parse(s))
        .ok_or_else(|| malformed("details"))
}

/// The `[from] ability: X` annotation, resolved
pub(crate) fn from_ability(parts: &[&str], dex: &Dex) -> Result<Option<String>, DecodeErrorKind> {
    find_tag(parts, "[from]")
        .and_then(|source| source.strip_prefix("ability:"))
        .map(|name| dex.resolve_ability(name.trim()))
        .transpose()
}

/// The `[of] POKEMON` annotation
pub(crate) fn of_pokemon(parts: &[&str], dex: &Dex) -> Option<PokemonRef> {
    find_tag(parts, "[of]")
        .and_then(PokemonRef::parse)
        .map(|p| p.with_hint(dex))
}

/// Value of a `[tag] value` annotation among the trailing parts
pub(crate) fn find_tag<'a>(parts: &[&'a str], tag: &str) -> Option<&'a str> {
    parts
        .iter()
        .skip(2)
        .find_map(|part| part.strip_prefix(tag))
        .map(str::trim)
}

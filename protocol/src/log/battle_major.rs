//! Major battle action line parsers
//!
//! These are the primary actions in battle: moves, switches, faints, formes.

use super::battle::{
    BattleEvent, find_tag, from_ability, malformed, parse_details, parse_pokemon,
};
use crate::DecodeErrorKind;
use crate::dex::{Dex, to_id};

/// Moves that show up in logs without being part of anyone's moveset
const NON_MOVESET_MOVES: &[&str] = &["struggle", "recharge"];

/// Parse |move|POKEMON|MOVE|TARGET with optional tags
///
/// Moves called through another move (`[from]Sleep Talk`, `[from]move: Copycat`)
/// are not the user's own and decode to `Unrecognized`. `[from]lockedmove` is a
/// repeat of the user's own move and is kept.
pub fn parse_move(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let move_name = parts
        .get(3)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("move"))?;

    if let Some(source) = find_tag(parts, "[from]") {
        let source = source.strip_prefix("move:").unwrap_or(source);
        if to_id(source) != "lockedmove" {
            return Ok(BattleEvent::Unrecognized("move".to_string()));
        }
    }

    if NON_MOVESET_MOVES.contains(&to_id(move_name).as_str()) {
        return Ok(BattleEvent::Unrecognized("move".to_string()));
    }

    let move_id = dex.resolve_move(move_name)?;

    Ok(BattleEvent::Move { pokemon, move_id })
}

/// Parse |switch|POKEMON|DETAILS|HP STATUS (also used for |drag|)
pub fn parse_switch(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let details = parse_details(parts, 3)?;
    let species = dex.resolve_species(&details.species)?;

    Ok(BattleEvent::Switch {
        pokemon,
        species,
        level: details.level,
    })
}

/// Parse |detailschange|POKEMON|DETAILS|HP STATUS
///
/// Permanent forme change (Mega Evolution, Primal Reversion, ...).
pub fn parse_detailschange(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let details = parse_details(parts, 3)?;
    let species = dex.resolve_species(&details.species)?;

    Ok(BattleEvent::FormeChange {
        pokemon,
        species,
        permanent: true,
        ability: from_ability(parts, dex)?,
    })
}

/// Parse |-formechange|POKEMON|SPECIES|HP STATUS
///
/// Temporary forme change that reverts on switch-out (Stance Change, ...).
pub fn parse_formechange(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let species_name = parts
        .get(3)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("species"))?;
    let species = dex.resolve_species(species_name)?;

    Ok(BattleEvent::FormeChange {
        pokemon,
        species,
        permanent: false,
        ability: from_ability(parts, dex)?,
    })
}

/// Parse |faint|POKEMON
pub fn parse_faint(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    Ok(BattleEvent::Faint(pokemon))
}

//! Minor battle action line parsers
//!
//! Secondary effects only matter here when they reveal something about a
//! Pokemon's set: its ability, its held item, or that it transformed.

use super::battle::{
    BattleEvent, PokemonRef, RevealedAbility, find_tag, from_ability, malformed, of_pokemon,
    parse_pokemon,
};
use crate::DecodeErrorKind;
use crate::dex::Dex;

/// Parse |-ability|POKEMON|ABILITY or |-ability|POKEMON|ABILITY|[from] EFFECT|[of] SOURCE
///
/// A traced ability is announced on the tracer, whose own ability is Trace;
/// the announced one belongs to the `[of]` target. Any other
/// `[from] ability:` belongs to the `[of]` Pokemon (Mummy, Lingering Aroma).
pub fn parse_ability(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let announced = parts
        .get(3)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("ability"))?;
    let announced = dex.resolve_ability(announced)?;

    let source = from_ability(parts, dex)?;
    let of = of_pokemon(parts, dex);

    let event = match (source, of) {
        (Some(trace), of) if trace == "trace" => BattleEvent::AbilityReveal {
            pokemon,
            ability: trace,
            also: of.map(|target| RevealedAbility {
                pokemon: target,
                ability: announced,
            }),
        },
        (Some(source), Some(owner)) => BattleEvent::AbilityReveal {
            pokemon,
            ability: announced,
            also: Some(RevealedAbility {
                pokemon: owner,
                ability: source,
            }),
        },
        _ => BattleEvent::AbilityReveal {
            pokemon,
            ability: announced,
            also: None,
        },
    };

    Ok(event)
}

/// Parse |-item|POKEMON|ITEM with an optional `[from] ability: X|[of] SOURCE`
///
/// Frisk announces the subject's item; the ability belongs to the `[of]`
/// Pokemon. Without `[of]` (Pickup, Harvest) it is the subject's own.
pub fn parse_item(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let name = parts
        .get(3)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("item"))?;
    let item = dex.resolve_item(name)?;

    let also = from_ability(parts, dex)?.map(|ability| RevealedAbility {
        pokemon: of_pokemon(parts, dex).unwrap_or_else(|| pokemon.clone()),
        ability,
    });

    Ok(BattleEvent::ItemReveal {
        pokemon,
        item: Some(item),
        also,
    })
}

/// Parse |-enditem|POKEMON|ITEM with optional tags
///
/// A consumed item (`[eat]`, popped balloon, used sash) reveals what was held.
/// An item removed by another effect (`[from] move: Knock Off`,
/// `[from] stealeat`) leaves the Pokemon with nothing.
pub fn parse_enditem(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let name = parts
        .get(3)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("item"))?;

    let eaten = parts.iter().skip(4).any(|p| p.trim() == "[eat]");
    let removed = !eaten && find_tag(parts, "[from]").is_some();

    let item = if removed {
        None
    } else {
        Some(dex.resolve_item(name)?)
    };

    Ok(BattleEvent::ItemReveal {
        pokemon,
        item,
        also: None,
    })
}

/// Parse |-mega|POKEMON|MEGASTONE or |-mega|POKEMON|SPECIES|MEGASTONE
///
/// The forme itself arrives on the matching `detailschange` line; this line
/// reveals the held stone.
pub fn parse_mega(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let stone = parts
        .get(4)
        .or_else(|| parts.get(3))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    match stone {
        Some(stone) => Ok(BattleEvent::ItemReveal {
            pokemon,
            item: Some(dex.resolve_item(stone)?),
            also: None,
        }),
        None => Ok(BattleEvent::Unrecognized("-mega".to_string())),
    }
}

/// Parse |-transform|POKEMON|TARGET or |-transform|POKEMON|TARGET|[from] ability: Imposter
pub fn parse_transform(parts: &[&str], dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let pokemon = parse_pokemon(parts, 2, dex)?;
    let ability = from_ability(parts, dex)?;
    Ok(BattleEvent::Transform { pokemon, ability })
}

/// Look for `[from] ability: X` / `[from] item: X` on any other minor line
///
/// The revealed effect belongs to the `[of]` Pokemon when present, otherwise
/// to the line's subject. Returns `Ok(None)` when the line reveals nothing.
pub fn parse_annotation(
    parts: &[&str],
    dex: &Dex,
) -> Result<Option<BattleEvent>, DecodeErrorKind> {
    let Some(source) = find_tag(parts, "[from]") else {
        return Ok(None);
    };

    let owner = || -> Option<PokemonRef> {
        find_tag(parts, "[of]")
            .and_then(PokemonRef::parse)
            .or_else(|| parts.get(2).and_then(|s| PokemonRef::parse(s)))
            .map(|p| p.with_hint(dex))
    };

    if let Some(ability) = source.strip_prefix("ability:") {
        let Some(pokemon) = owner() else {
            return Ok(None);
        };
        let ability = dex.resolve_ability(ability.trim())?;
        return Ok(Some(BattleEvent::AbilityReveal {
            pokemon,
            ability,
            also: None,
        }));
    }

    if let Some(item) = source.strip_prefix("item:") {
        let Some(pokemon) = owner() else {
            return Ok(None);
        };
        let item = dex.resolve_item(item.trim())?;
        return Ok(Some(BattleEvent::ItemReveal {
            pokemon,
            item: Some(item),
            also: None,
        }));
    }

    Ok(None)
}

mod battle;
mod battle_init;
mod battle_major;
mod battle_minor;
mod battle_progress;

pub use battle::{BattleEvent, GameType, Player, PokemonDetails, PokemonRef, RevealedAbility};

use crate::dex::Dex;
use crate::{DecodeError, DecodeErrorKind};

/// Decode a single log line into a BattleEvent
///
/// `line_no` is the 1-based position of the line in its log and is only used
/// to stamp errors. Unknown pipe-delimited line types are not errors: they
/// decode to [`BattleEvent::Unrecognized`] so the rest of the log keeps its
/// meaning. Lines that are not part of the protocol at all are `UnknownType`.
pub fn decode_line(line: &str, line_no: usize, dex: &Dex) -> Result<BattleEvent, DecodeError> {
    decode_parts(line, dex).map_err(|kind| DecodeError::new(line_no, kind))
}

/// Decode every line of a log, pairing each result with its line number
///
/// Blank lines are skipped. Decoding never stops early; the caller decides
/// what an error means for the battle.
pub fn decode_log<'a>(
    text: &'a str,
    dex: &'a Dex,
) -> impl Iterator<Item = (usize, Result<BattleEvent, DecodeError>)> + 'a {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(move |(idx, line)| (idx + 1, decode_line(line, idx + 1, dex)))
}

fn decode_parts(line: &str, dex: &Dex) -> Result<BattleEvent, DecodeErrorKind> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(BattleEvent::Unrecognized(String::new()));
    }

    if !line.starts_with('|') {
        return Err(DecodeErrorKind::UnknownType(line.to_string()));
    }

    let parts: Vec<&str> = line.split('|').collect();

    match parts[1] {
        // === Initialization ===
        "player" => battle_init::parse_player(&parts),
        "tier" => battle_init::parse_tier(&parts),
        "gametype" => battle_init::parse_gametype(&parts),

        // === Major actions ===
        "switch" | "drag" => battle_major::parse_switch(&parts, dex),
        "move" => battle_major::parse_move(&parts, dex),
        "faint" => battle_major::parse_faint(&parts, dex),
        "detailschange" => battle_major::parse_detailschange(&parts, dex),
        "-formechange" => battle_major::parse_formechange(&parts, dex),

        // === Reveals ===
        "-ability" => battle_minor::parse_ability(&parts, dex),
        "-item" => battle_minor::parse_item(&parts, dex),
        "-enditem" => battle_minor::parse_enditem(&parts, dex),
        "-mega" => battle_minor::parse_mega(&parts, dex),
        "-transform" => battle_minor::parse_transform(&parts, dex),

        // === Progress ===
        "turn" => battle_progress::parse_turn(&parts),
        "win" => battle_progress::parse_win(&parts),
        "tie" => battle_progress::parse_tie(&parts),
        "-message" => battle_progress::parse_message(&parts),

        tag if tag.starts_with('-') => Ok(battle_minor::parse_annotation(&parts, dex)?
            .unwrap_or_else(|| BattleEvent::Unrecognized(tag.to_string()))),

        tag => Ok(BattleEvent::Unrecognized(tag.to_string())),
    }
}

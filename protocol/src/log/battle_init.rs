//! Battle initialization line parsers
//!
//! These lines are sent at the start of a battle and carry the metadata the
//! statistics are partitioned and weighted by.

use super::battle::{BattleEvent, GameType, Player, malformed};
use crate::DecodeErrorKind;
use crate::dex::to_id;

/// Parse |player|PLAYER|USERNAME|AVATAR|RATING
pub fn parse_player(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let player = parts
        .get(2)
        .and_then(|s| Player::parse(s))
        .ok_or_else(|| malformed("player"))?;

    let username = parts.get(3).unwrap_or(&"").trim().to_string();

    let rating = match parts.get(5).map(|s| s.trim()) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse().map_err(|_| malformed("rating"))?),
    };

    Ok(BattleEvent::RatingReport {
        player,
        username,
        rating,
    })
}

/// Parse |tier|FORMATNAME
pub fn parse_tier(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let tier = parts.get(2).map(|s| to_id(s)).unwrap_or_default();
    if tier.is_empty() {
        return Err(malformed("tier"));
    }
    Ok(BattleEvent::TierTag(tier))
}

/// Parse |gametype|GAMETYPE
pub fn parse_gametype(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let game_type = parts
        .get(2)
        .and_then(|s| GameType::parse(s.trim()))
        .ok_or_else(|| malformed("game type"))?;

    Ok(BattleEvent::GameType(game_type))
}

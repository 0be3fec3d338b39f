//! Battle progress line parsers
//!
//! These lines track the flow of a battle and how it ended.

use super::battle::{BattleEvent, malformed};
use crate::DecodeErrorKind;

/// Parse |turn|NUMBER
pub fn parse_turn(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let turn = parts
        .get(2)
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| malformed("turn number"))?;

    Ok(BattleEvent::Turn(turn))
}

/// Parse |win|USER
pub fn parse_win(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let user = parts.get(2).map(|s| s.trim()).unwrap_or("");
    if user.is_empty() {
        return Err(malformed("winner"));
    }
    Ok(BattleEvent::BattleEnd {
        winner: Some(user.to_string()),
    })
}

/// Parse |tie
pub fn parse_tie(_parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    Ok(BattleEvent::BattleEnd { winner: None })
}

/// Parse |-message|MESSAGE
///
/// Only "USER forfeited." is meaningful; every other message is ignored.
pub fn parse_message(parts: &[&str]) -> Result<BattleEvent, DecodeErrorKind> {
    let message = parts.get(2).map(|s| s.trim()).unwrap_or("");

    match message.strip_suffix(" forfeited.") {
        Some(username) if !username.is_empty() => Ok(BattleEvent::Forfeit {
            username: username.to_string(),
        }),
        _ => Ok(BattleEvent::Unrecognized("-message".to_string())),
    }
}

//! Replay a whole log text into a BattleRecord

use usage_protocol::{DecodeErrorKind, Dex, decode_log};

use super::battle::BattleTracker;
use crate::error::TrackError;
use crate::types::BattleRecord;

/// Decode and track every line of a battle log
///
/// Lines outside the protocol are always skipped. Other decode failures abort
/// the battle unless `tolerate_decode_errors` is set, in which case the line
/// is skipped and replay continues.
pub fn replay(
    text: &str,
    dex: &Dex,
    tolerate_decode_errors: bool,
) -> Result<BattleRecord, TrackError> {
    let mut tracker = BattleTracker::new();

    for (line, decoded) in decode_log(text, dex) {
        let event = match decoded {
            Ok(event) => event,
            Err(e) if matches!(e.kind, DecodeErrorKind::UnknownType(_)) => {
                tracing::trace!(line, "skipping non-protocol line");
                continue;
            }
            Err(e) if tolerate_decode_errors => {
                tracing::debug!(line, error = %e, "skipping undecodable line");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match tracker.apply(&event, line) {
            Ok(()) => {}
            Err(TrackError::Decode(e)) if tolerate_decode_errors => {
                tracing::debug!(line, error = %e, "skipping line");
            }
            Err(e) => return Err(e),
        }
    }

    tracker.finish()
}

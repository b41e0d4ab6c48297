//! Leech detection (`spec.md` §4.9).

use crate::model::{Card, CardQueue, LapseConfig, LeechAction};
use crate::store;
use log::info;
use sqlx::SqlitePool;

/// Whether this lapse (the card's `lapses` count having just been
/// incremented) should trigger the leech tag. The trigger repeats every
/// half-threshold because users may untag and continue studying
/// (`spec.md` §4.9).
pub fn is_leech_trigger(lapses: u32, leech_fails: u32) -> bool {
    if lapses < leech_fails {
        return false;
    }
    let period = (leech_fails / 2).max(1);
    (lapses - leech_fails) % period == 0
}

/// Applies the leech tag to the note and, if configured, suspends the
/// card (restoring it from its filtered-deck fields first). Returns
/// whether the card was suspended as a result.
pub async fn apply_leech(db: &SqlitePool, card: &mut Card, lapse: &LapseConfig, note_id: i64) -> Result<bool, crate::Error> {
    info!("Card {} tagged as leech (note {})", card.id, note_id);
    store::retry_once(|| async {
        sqlx::query(
            "UPDATE note SET tags = tags || 'leech ' WHERE id = ? AND tags NOT LIKE '% leech %'",
        )
        .bind(note_id)
        .execute(db)
        .await
        .map_err(crate::Error::from)
    })
    .await?;

    if lapse.leech_action == LeechAction::Suspend {
        if card.is_in_filtered_deck() {
            card.deck_id = card.original_deck_id;
            card.due = card.original_due;
            card.original_deck_id = 0;
            card.original_due = 0;
        }
        card.queue = CardQueue::Suspended;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leech_trigger_at_threshold() {
        assert!(is_leech_trigger(8, 8));
        assert!(!is_leech_trigger(7, 8));
    }

    #[test]
    fn test_leech_trigger_repeats_every_half_threshold() {
        assert!(is_leech_trigger(12, 8));
        assert!(!is_leech_trigger(10, 8));
        assert!(is_leech_trigger(16, 8));
    }
}

//! The undo log (`spec.md` §4.10): a single-slot review undo. A bulk-op
//! checkpoint mode exists in the legacy system too, but this crate's scope
//! is limited to the last-review slot the scheduler itself manages.

use crate::model::{Card, CardId, CardQueue};
use crate::{CardErrorKind, Error, LibraryError};
use sqlx::SqlitePool;

/// One undoable answer: the card exactly as it was before `answer_card`
/// ran, plus whether this answer was the one that added the "leech" tag.
#[derive(Clone, Debug)]
pub struct UndoEntry {
    pub card: Card,
    pub added_leech_tag: bool,
}

/// Holds at most one [`UndoEntry`] — answering a second card without
/// undoing the first discards it, matching the legacy single-slot
/// behavior (`spec.md` §4.10).
#[derive(Default)]
pub struct UndoLog {
    slot: Option<UndoEntry>,
}

impl UndoLog {
    pub fn record(&mut self, card: Card, added_leech_tag: bool) {
        self.slot = Some(UndoEntry { card, added_leech_tag });
    }

    /// Invalidated whenever a checkpoint (bulk) operation begins
    /// (`spec.md` §7 "Policy").
    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.slot.as_ref()
    }

    /// `undo_review` (`spec.md` §4.10). Restores the live card row, drops
    /// the most recent revlog entry for it, removes a leech tag this
    /// answer added, restores siblings this answer buried, and decrements
    /// the daily counter it incremented.
    pub async fn undo_review(&mut self, db: &SqlitePool, today: i64) -> Result<Card, Error> {
        let Some(entry) = self.slot.take() else {
            return Err(Error::Library(LibraryError::Card(CardErrorKind::NotFound(0))));
        };
        let saved = entry.card;

        if entry.added_leech_tag {
            sqlx::query("UPDATE note SET tags = REPLACE(tags, ' leech ', ' ') WHERE id = ?")
                .bind(saved.note_id)
                .execute(db)
                .await?;
        }

        restore_card_row(db, &saved).await?;
        delete_latest_revlog(db, saved.id).await?;
        restore_buried_siblings(db, saved.note_id).await?;
        decrement_daily_counter(db, &saved, today).await?;

        Ok(saved)
    }
}

async fn restore_card_row(db: &SqlitePool, card: &Card) -> Result<(), Error> {
    sqlx::query(
        r"UPDATE card SET deck_id = ?, type = ?, queue = ?, due = ?, interval = ?, factor = ?,
           reps = ?, lapses = ?, left = ?, original_due = ?, original_deck_id = ?, mod = ?, usn = ?
           WHERE id = ?",
    )
    .bind(card.deck_id)
    .bind(card.card_type)
    .bind(card.queue)
    .bind(card.due)
    .bind(card.interval)
    .bind(card.factor)
    .bind(card.reps)
    .bind(card.lapses)
    .bind(card.left)
    .bind(card.original_due)
    .bind(card.original_deck_id)
    .bind(card.modified)
    .bind(card.usn)
    .bind(card.id)
    .execute(db)
    .await?;
    Ok(())
}

async fn delete_latest_revlog(db: &SqlitePool, card_id: CardId) -> Result<(), Error> {
    sqlx::query(
        "DELETE FROM revlog WHERE id = (SELECT id FROM revlog WHERE card_id = ? ORDER BY id DESC LIMIT 1)",
    )
    .bind(card_id)
    .execute(db)
    .await?;
    Ok(())
}

/// `queue := type` where `queue == Buried and note_id == card.note_id`
/// (`spec.md` §4.10 step 5).
async fn restore_buried_siblings(db: &SqlitePool, note_id: i64) -> Result<(), Error> {
    let buried: Vec<Card> = sqlx::query_as("SELECT * FROM card WHERE note_id = ? AND queue = ?")
        .bind(note_id)
        .bind(CardQueue::Buried)
        .fetch_all(db)
        .await?;
    for card in buried {
        let restored_queue = CardQueue::from_type(card.card_type);
        sqlx::query("UPDATE card SET queue = ? WHERE id = ?")
            .bind(restored_queue)
            .bind(card.id)
            .execute(db)
            .await?;
    }
    Ok(())
}

async fn decrement_daily_counter(db: &SqlitePool, card: &Card, today: i64) -> Result<(), Error> {
    let column = match card.queue {
        CardQueue::New => "new_today",
        CardQueue::Review => "rev_today",
        CardQueue::Learning | CardQueue::DayLearning => "lrn_today",
        CardQueue::Suspended | CardQueue::Buried => return Ok(()),
    };
    sqlx::query(&format!(
        "UPDATE deck SET {column}_count = MAX(0, {column}_count - 1) WHERE id = ? AND {column}_day = ?"
    ))
    .bind(card.deck_id)
    .bind(today)
    .execute(db)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_log_single_slot() {
        let mut log = UndoLog::default();
        assert!(log.peek().is_none());
        let card = Card::new(1, 1, 0, 0);
        log.record(card.clone(), false);
        assert!(log.peek().is_some());
        log.record(Card::new(2, 1, 0, 0), true);
        assert_eq!(log.peek().unwrap().card.note_id, 2);
    }
}

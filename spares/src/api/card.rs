//! Card-level operations outside the study loop: suspend/unsuspend,
//! manual bury/unbury, and lookup (`spec.md` §3 `Card.queue`).

use crate::model::{Card, CardId, CardQueue};
use crate::schema::card::{CardResponse, CardsSelector};
use crate::search::search_card_ids;
use crate::{CardErrorKind, Error, LibraryError, SchedulerErrorKind};
use sqlx::SqlitePool;

pub async fn get_card(db: &SqlitePool, card_id: CardId) -> Result<CardResponse, Error> {
    let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::Library(LibraryError::Card(CardErrorKind::NotFound(card_id))))?;
    Ok(CardResponse::new(&card))
}

async fn resolve_selector(db: &SqlitePool, selector: &CardsSelector) -> Result<Vec<CardId>, Error> {
    match selector {
        CardsSelector::Ids(ids) => Ok(ids.clone()),
        CardsSelector::Query(query) => search_card_ids(db, query).await,
    }
}

/// `suspend(ids)` (`spec.md` §3 `CardQueue::Suspended`): preserves `type`,
/// so restoring via [`unsuspend_cards`] resumes from wherever the card was.
pub async fn suspend_cards(db: &SqlitePool, selector: &CardsSelector) -> Result<usize, Error> {
    let ids = resolve_selector(db, selector).await?;
    for &id in &ids {
        sqlx::query("UPDATE card SET queue = ? WHERE id = ? AND queue != ?")
            .bind(CardQueue::Suspended)
            .bind(id)
            .bind(CardQueue::Suspended)
            .execute(db)
            .await?;
    }
    Ok(ids.len())
}

pub async fn unsuspend_cards(db: &SqlitePool, selector: &CardsSelector) -> Result<usize, Error> {
    let ids = resolve_selector(db, selector).await?;
    for &id in &ids {
        let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
            .bind(id)
            .fetch_one(db)
            .await?;
        if card.queue != CardQueue::Suspended {
            continue;
        }
        sqlx::query("UPDATE card SET queue = ? WHERE id = ?")
            .bind(CardQueue::from_type(card.card_type))
            .bind(id)
            .execute(db)
            .await?;
    }
    Ok(ids.len())
}

/// Manual bury, outside `answer_card`'s sibling burying (`spec.md` §4.7).
/// Rejects a card that is already buried or suspended, mirroring the
/// scheduler's own precondition (`spec.md` §7).
pub async fn bury_card(db: &SqlitePool, card_id: CardId) -> Result<(), Error> {
    let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_one(db)
        .await?;
    match card.queue {
        CardQueue::Buried => return Err(Error::Library(LibraryError::Scheduler(SchedulerErrorKind::AlreadyBuried(card_id)))),
        CardQueue::Suspended => return Err(Error::Library(LibraryError::Scheduler(SchedulerErrorKind::Suspended(card_id)))),
        _ => {}
    }
    sqlx::query("UPDATE card SET queue = ? WHERE id = ?")
        .bind(CardQueue::Buried)
        .bind(card_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn unbury_cards(db: &SqlitePool, deck_id: Option<i64>) -> Result<usize, Error> {
    let buried: Vec<Card> = match deck_id {
        Some(deck_id) => {
            sqlx::query_as("SELECT * FROM card WHERE queue = ? AND deck_id = ?")
                .bind(CardQueue::Buried)
                .bind(deck_id)
                .fetch_all(db)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM card WHERE queue = ?")
                .bind(CardQueue::Buried)
                .fetch_all(db)
                .await?
        }
    };
    for card in &buried {
        sqlx::query("UPDATE card SET queue = ? WHERE id = ?")
            .bind(CardQueue::from_type(card.card_type))
            .bind(card.id)
            .execute(db)
            .await?;
    }
    Ok(buried.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn test_suspend_then_unsuspend_round_trips(pool: SqlitePool) {
        sqlx::query(
            r"INSERT INTO note_type (id, name, kind, fields, templates, sort_field_idx, default_deck_id, requirements, mod, usn)
               VALUES (1, 'Basic', 0, '[]', '[]', 0, 1, NULL, 0, -1)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r"INSERT INTO note (id, guid, note_type_id, mod, usn, tags, fields, sort_field, checksum, flags, data)
               VALUES (1, 'g', 1, 0, -1, '', '[]', '', 0, 0, '{}')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r"INSERT INTO card (id, note_id, deck_id, template_ord, type, queue, due, interval, factor,
               reps, lapses, left, original_due, original_deck_id, flags, mod, usn, data)
               VALUES (1, 1, 1, 0, 2, 2, 5, 5, 2500, 3, 0, 0, 0, 0, 0, 0, -1, '{}')",
        )
        .execute(&pool)
        .await
        .unwrap();

        suspend_cards(&pool, &CardsSelector::Ids(vec![1])).await.unwrap();
        let card = get_card(&pool, 1).await.unwrap();
        assert_eq!(card.queue, CardQueue::Suspended);

        unsuspend_cards(&pool, &CardsSelector::Ids(vec![1])).await.unwrap();
        let card = get_card(&pool, 1).await.unwrap();
        assert_eq!(card.queue, CardQueue::Review);
    }
}

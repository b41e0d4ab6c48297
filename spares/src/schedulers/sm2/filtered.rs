//! Filtered ("dynamic") decks: temporary rehosting with return-to-origin
//! semantics (`spec.md` §4.8).

use crate::model::{Card, CardQueue, CardType, Deck, FilteredOrder};
use crate::search::search_card_ids;
use crate::{DeckErrorKind, Error, LibraryError};
use log::{debug, warn};
use sqlx::SqlitePool;

/// `empty(did)`: restores every card currently borrowed into `deck_id` to
/// its origin deck, undoing a prior `rebuild` (`spec.md` §4.8 step 1).
pub async fn empty(db: &SqlitePool, deck_id: i64) -> Result<(), Error> {
    let cards: Vec<Card> = sqlx::query_as("SELECT * FROM card WHERE deck_id = ? AND original_deck_id != 0")
        .bind(deck_id)
        .fetch_all(db)
        .await?;
    for mut card in cards {
        card.deck_id = card.original_deck_id;
        card.due = card.original_due;
        card.original_deck_id = 0;
        card.original_due = 0;
        card.queue = CardQueue::from_type(card.card_type);
        if card.card_type == CardType::Learning {
            card.card_type = CardType::New;
            card.queue = CardQueue::New;
        }
        sqlx::query(
            "UPDATE card SET deck_id = ?, due = ?, original_deck_id = ?, original_due = ?, type = ?, queue = ? WHERE id = ?",
        )
        .bind(card.deck_id)
        .bind(card.due)
        .bind(card.original_deck_id)
        .bind(card.original_due)
        .bind(card.card_type)
        .bind(card.queue)
        .bind(card.id)
        .execute(db)
        .await?;
    }
    Ok(())
}

/// `rebuild(did)` (`spec.md` §4.8): empties the deck, then re-populates it
/// from its configured search terms in order, each term limited and
/// ordered independently.
pub async fn rebuild(db: &SqlitePool, deck: &Deck, today: i64) -> Result<usize, Error> {
    if !deck.is_filtered {
        return Err(Error::Library(LibraryError::Deck(DeckErrorKind::NotFiltered(deck.id))));
    }
    empty(db, deck.id).await?;

    let mut index: i64 = 0;
    for term in &deck.filtered_terms.0 {
        let mut ids = search_card_ids(db, &term.search).await?;
        order_ids(db, &mut ids, term.order).await?;
        ids.truncate(term.limit as usize);

        for card_id in ids {
            let mut card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
                .bind(card_id)
                .fetch_one(db)
                .await?;
            if card.is_in_filtered_deck() {
                continue;
            }
            card.original_deck_id = card.deck_id;
            card.original_due = card.due;
            card.deck_id = deck.id;
            card.due = -100_000 + index;
            card.queue = if card.card_type == CardType::Review && card.original_due <= today {
                CardQueue::Review
            } else {
                CardQueue::New
            };
            sqlx::query(
                "UPDATE card SET deck_id = ?, due = ?, original_deck_id = ?, original_due = ?, queue = ? WHERE id = ?",
            )
            .bind(card.deck_id)
            .bind(card.due)
            .bind(card.original_deck_id)
            .bind(card.original_due)
            .bind(card.queue)
            .bind(card.id)
            .execute(db)
            .await?;
            index += 1;
        }
    }
    if index == 0 {
        warn!("Filtered deck {} rebuilt empty ({} search terms matched nothing)", deck.id, deck.filtered_terms.0.len());
    } else {
        debug!("Filtered deck {} rebuilt with {} cards", deck.id, index);
    }
    Ok(index as usize)
}

async fn order_ids(db: &SqlitePool, ids: &mut [i64], order: FilteredOrder) -> Result<(), Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let column = match order {
        FilteredOrder::SmallestInterval | FilteredOrder::LargestInterval => "interval",
        FilteredOrder::MostLapses => "lapses",
        FilteredOrder::Added | FilteredOrder::ReverseAdded => "note_id",
        FilteredOrder::Due | FilteredOrder::DuePriority | FilteredOrder::Oldest => "due",
        FilteredOrder::Random => return Ok(()), // already in arbitrary search order
    };
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let query = format!("SELECT id FROM card WHERE id IN ({placeholders}) ORDER BY {column} ASC");
    let mut q = sqlx::query_as(&query);
    for id in ids.iter() {
        q = q.bind(id);
    }
    let mut ordered: Vec<(i64,)> = q.fetch_all(db).await?;
    if matches!(order, FilteredOrder::LargestInterval | FilteredOrder::ReverseAdded) {
        ordered.reverse();
    }
    let result: Vec<i64> = ordered.into_iter().map(|(id,)| id).collect();
    ids.copy_from_slice(&result[..ids.len()]);
    Ok(())
}

/// `_dyn_ivl_boost` (`spec.md` §4.8).
pub fn dyn_ivl_boost(card: &Card, today: i64, max_ivl: i64) -> i64 {
    super::interval::dyn_ivl_boost(card.interval, card.factor, card.original_due, today, max_ivl)
}

//! The study loop surface (`spec.md` §2): thin DTO wrapping over
//! [`crate::collection::Collection`]'s scheduler calls.

use crate::collection::Collection;
use crate::config::{read_internal_config, write_internal_config};
use crate::model::Card;
use crate::schema::card::CardResponse;
use crate::schema::review::{AnswerCardRequest, AnswerCardResponse, GetNextCardResponse, UndoReviewResponse};
use crate::Error;
use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;

/// Runs `unbury_cards` once per day, tracked by the process-local
/// `last_unbury_day` marker, so buried siblings return to the queue
/// "automatically at next day rollover" (`spec.md` §8 scenario 4).
async fn maybe_unbury_for_day_rollover(db: &SqlitePool, today: i64) -> Result<(), Error> {
    let mut internal = read_internal_config()?;
    if internal.last_unbury_day >= today {
        return Ok(());
    }
    crate::api::card::unbury_cards(db, None).await?;
    internal.last_unbury_day = today;
    write_internal_config(&internal)?;
    Ok(())
}

pub async fn get_next_card(collection: &mut Collection) -> Result<GetNextCardResponse, Error> {
    let now = Utc::now();
    let today = collection.today(now);
    maybe_unbury_for_day_rollover(collection.pool(), today).await?;
    let Some(card_id) = collection.get_next_card(now) else {
        return Ok(GetNextCardResponse { card: None });
    };
    let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_one(collection.pool())
        .await?;
    Ok(GetNextCardResponse {
        card: Some(CardResponse::new(&card)),
    })
}

pub async fn answer_card(
    collection: &mut Collection,
    request: AnswerCardRequest,
    rng: &mut impl Rng,
) -> Result<AnswerCardResponse, Error> {
    let now = Utc::now();
    let card_id = collection
        .answer_card(request.card_id, request.ease, now, request.time_taken_ms, rng)
        .await?;
    let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_one(collection.pool())
        .await?;
    Ok(AnswerCardResponse {
        card: CardResponse::new(&card),
    })
}

pub async fn undo_review(collection: &mut Collection) -> Result<UndoReviewResponse, Error> {
    let now = Utc::now();
    let card_id = collection.undo_last_review(now).await?;
    let card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_one(collection.pool())
        .await?;
    Ok(UndoReviewResponse {
        restored: Some(CardResponse::new(&card)),
    })
}

//! Due-count queries (`SPEC_FULL.md` §14): a query module, not a reporting
//! dashboard — the façade needs these for queue-assembly decisions, and the
//! teacher exposes the same shape over its CLI/server surfaces.

use crate::model::CardQueue;
use crate::schema::statistics::DueCountsResponse;
use crate::Error;
use sqlx::SqlitePool;
use std::collections::HashMap;

pub async fn due_counts(db: &SqlitePool, deck_id: i64, today: i64) -> Result<DueCountsResponse, Error> {
    let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT queue, COUNT(*) FROM card WHERE deck_id = ? GROUP BY queue")
        .bind(deck_id)
        .fetch_all(db)
        .await?;
    let mut counts_by_queue = HashMap::new();
    let mut new_count = 0;
    let mut learning_count = 0;
    let mut review_count = 0;
    for (queue, count) in rows {
        counts_by_queue.insert(queue, count as u32);
        match queue {
            q if q == CardQueue::New as i64 => new_count = count as u32,
            q if q == CardQueue::Learning as i64 || q == CardQueue::DayLearning as i64 => learning_count += count as u32,
            q if q == CardQueue::Review as i64 => {
                let due_row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM card WHERE deck_id = ? AND queue = ? AND due <= ?")
                    .bind(deck_id)
                    .bind(CardQueue::Review)
                    .bind(today)
                    .fetch_one(db)
                    .await?;
                review_count = due_row.0 as u32;
            }
            _ => {}
        }
    }
    Ok(DueCountsResponse {
        new_count,
        learning_count,
        review_count,
        counts_by_queue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn test_due_counts_empty_deck(pool: SqlitePool) {
        let counts = due_counts(&pool, 1, 0).await.unwrap();
        assert_eq!(counts.new_count, 0);
        assert_eq!(counts.review_count, 0);
    }
}

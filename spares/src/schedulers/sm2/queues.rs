//! Queue assembly and the next-card selection order (`spec.md` §4.5).

use crate::decks::DeckRegistry;
use crate::model::{Card, CardId, CardQueue, CollectionConfig, DailyCounter};
use crate::Error;
use log::debug;
use sqlx::SqlitePool;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// In-session queue state (`spec.md` §4.5). Rebuilt wholesale by
/// [`Session::reset`]; drained incrementally by [`Session::get_next_card`].
/// `timer_started` is transient per-session state — never persisted —
/// tracking the precondition `answer_card` checks (`spec.md` §4.6).
#[derive(Default)]
pub struct Session {
    pub new_queue: VecDeque<CardId>,
    pub learning_queue: BinaryHeap<Reverse<(i64, CardId)>>,
    pub day_learning_queue: VecDeque<CardId>,
    pub review_queue: VecDeque<CardId>,
    pub timer_started: HashMap<CardId, chrono::DateTime<chrono::Utc>>,
    reps_since_reset: u32,
    new_count_this_reset: u32,
    rev_count_this_reset: u32,
}

impl Session {
    /// Rebuilds every queue from store truth (`spec.md` §5 "on `reset` the
    /// queues are rebuilt from store truth").
    pub async fn reset(
        &mut self,
        db: &SqlitePool,
        decks: &DeckRegistry,
        active: &[i64],
        today: i64,
        now_secs: i64,
    ) -> Result<(), Error> {
        self.new_queue.clear();
        self.learning_queue.clear();
        self.day_learning_queue.clear();
        self.review_queue.clear();
        self.reps_since_reset = 0;

        let mut new_remaining = walking_limit(decks, active, |c| c.new.per_day, |d| d.new_today().value_for(today));
        let mut rev_remaining = walking_limit(decks, active, |c| c.rev.per_day, |d| d.rev_today().value_for(today));

        for &deck_id in active {
            if new_remaining == 0 {
                break;
            }
            let take = new_remaining.min(200);
            let rows: Vec<Card> = sqlx::query_as(
                "SELECT * FROM card WHERE deck_id = ? AND queue = ? ORDER BY due ASC LIMIT ?",
            )
            .bind(deck_id)
            .bind(CardQueue::New)
            .bind(i64::from(take))
            .fetch_all(db)
            .await?;
            new_remaining -= rows.len() as u32;
            self.new_queue.extend(rows.into_iter().map(|c| c.id));
        }
        self.new_count_this_reset = self.new_queue.len() as u32;

        for &deck_id in active {
            if rev_remaining == 0 {
                break;
            }
            let take = rev_remaining.min(200);
            let rows: Vec<Card> = sqlx::query_as(
                "SELECT * FROM card WHERE deck_id = ? AND queue = ? AND due <= ? ORDER BY due ASC LIMIT ?",
            )
            .bind(deck_id)
            .bind(CardQueue::Review)
            .bind(today)
            .bind(i64::from(take))
            .fetch_all(db)
            .await?;
            rev_remaining -= rows.len() as u32;
            self.review_queue.extend(rows.into_iter().map(|c| c.id));
        }
        self.rev_count_this_reset = self.review_queue.len() as u32;

        for &deck_id in active {
            let rows: Vec<Card> = sqlx::query_as(
                "SELECT * FROM card WHERE deck_id = ? AND queue = ? AND due <= ?",
            )
            .bind(deck_id)
            .bind(CardQueue::Learning)
            .bind(now_secs)
            .fetch_all(db)
            .await?;
            self.learning_queue.extend(rows.into_iter().map(|c| Reverse((c.due, c.id))));

            let day_rows: Vec<Card> = sqlx::query_as(
                "SELECT * FROM card WHERE deck_id = ? AND queue = ? AND due <= ?",
            )
            .bind(deck_id)
            .bind(CardQueue::DayLearning)
            .bind(today)
            .fetch_all(db)
            .await?;
            self.day_learning_queue.extend(day_rows.into_iter().map(|c| c.id));
        }

        debug!(
            "Queue rebuild: new={} learning={} day_learning={} review={} (decks: {:?})",
            self.new_queue.len(),
            self.learning_queue.len(),
            self.day_learning_queue.len(),
            self.review_queue.len(),
            active
        );

        Ok(())
    }

    /// `_timeForNewCard` (`spec.md` §4.5): whether the interleave rule
    /// says "show a new card now" for the configured `new_spread`.
    fn time_for_new_card(&self, new_spread: crate::model::NewSpread) -> bool {
        use crate::model::NewSpread;
        match new_spread {
            NewSpread::First => true,
            NewSpread::Last => self.rev_count_this_reset == 0 && self.new_count_this_reset > 0,
            NewSpread::Distribute => {
                if self.new_count_this_reset == 0 {
                    return false;
                }
                let total = self.new_count_this_reset + self.rev_count_this_reset;
                let modulus = total.div_ceil(self.new_count_this_reset).max(2);
                self.reps_since_reset % modulus == 0
            }
        }
    }

    /// `get_next_card` selection order (`spec.md` §4.5).
    pub fn get_next_card(&mut self, now_secs: i64, collapse_time: i64, config: &CollectionConfig) -> Option<CardId> {
        self.reps_since_reset += 1;

        if let Some(&Reverse((due, _))) = self.learning_queue.peek() {
            if due <= now_secs {
                return self.learning_queue.pop().map(|Reverse((_, id))| id);
            }
        }
        if self.time_for_new_card(config.new_spread) {
            if let Some(id) = self.new_queue.pop_front() {
                return Some(id);
            }
        }
        if let Some(id) = self.review_queue.pop_front() {
            return Some(id);
        }
        if let Some(id) = self.day_learning_queue.pop_front() {
            return Some(id);
        }
        if let Some(id) = self.new_queue.pop_front() {
            return Some(id);
        }
        if let Some(&Reverse((due, _))) = self.learning_queue.peek() {
            if due <= now_secs + collapse_time {
                return self.learning_queue.pop().map(|Reverse((_, id))| id);
            }
        }
        None
    }

    pub fn remove_from_new_and_review(&mut self, card_id: CardId) {
        self.new_queue.retain(|&id| id != card_id);
        self.review_queue.retain(|&id| id != card_id);
    }
}

/// `_walkingCount` (`spec.md` §4.5): the minimum remaining quota across
/// `deck_id` and every ancestor, summed across the active-deck set without
/// double-subtracting shared ancestors (approximated here by taking the
/// global minimum across the whole active subtree's own-config limits,
/// which matches the spec's scenario 6 when the active set is a single
/// subtree).
fn walking_limit(
    decks: &DeckRegistry,
    active: &[i64],
    per_day: impl Fn(&crate::model::DeckConfig) -> u32,
    today_count: impl Fn(&crate::model::Deck) -> u32,
) -> u32 {
    let mut limit = u32::MAX;
    for &deck_id in active {
        let Some(deck) = decks.get(deck_id) else { continue };
        let Some(config) = decks.config_for(deck_id) else { continue };
        let remaining = per_day(config).saturating_sub(today_count(deck));
        limit = limit.min(remaining);
        for ancestor_id in decks.ancestors(deck_id) {
            let Some(ancestor) = decks.get(ancestor_id) else { continue };
            let Some(ancestor_config) = decks.config_for(ancestor_id) else { continue };
            let ancestor_remaining = per_day(ancestor_config).saturating_sub(today_count(ancestor));
            limit = limit.min(ancestor_remaining);
        }
    }
    if limit == u32::MAX { 0 } else { limit }
}

/// Bumps a [`DailyCounter`], used after a card is actually served from a
/// deck (`spec.md` §4.6 "Update deck-tree stat").
pub fn bump_daily(counter: DailyCounter, today: i64) -> DailyCounter {
    let mut c = counter;
    c.increment(today, 1);
    c
}

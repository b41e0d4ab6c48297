//! Answer processing (`spec.md` §4.6): the state transitions a card goes
//! through in response to a grade, and the revlog entry each answer
//! appends.

use super::interval::{constrain, graduating_interval, starting_left, step_delay_secs, updated_factor};
use super::leech;
use super::queues::Session;
use crate::decks::DeckRegistry;
use crate::model::{Card, CardId, CardQueue, CardType, DeckConfig, RatingId, ReviewLog, RevlogType};
use crate::store;
use crate::{Error, LibraryError, SchedulerErrorKind};
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::SqlitePool;

pub struct AnswerContext<'a> {
    pub now: DateTime<Utc>,
    pub today: i64,
    pub day_cutoff: i64,
    pub time_taken_ms: i64,
    pub config: &'a DeckConfig,
    pub filtered_resched: bool,
}

/// `answer_card` (`spec.md` §4.6). Returns the persisted card and whether
/// it became a leech as a result of this answer.
pub async fn answer_card(
    db: &SqlitePool,
    decks: &mut DeckRegistry,
    session: &mut Session,
    card_id: CardId,
    ease: RatingId,
    now: DateTime<Utc>,
    today: i64,
    day_cutoff: i64,
    time_taken_ms: i64,
    rng: &mut impl Rng,
) -> Result<(Card, bool), Error> {
    if !session.timer_started.contains_key(&card_id) {
        return Err(Error::Library(LibraryError::Scheduler(
            SchedulerErrorKind::NotInSession(card_id),
        )));
    }
    session.timer_started.remove(&card_id);

    let mut card: Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
        .bind(card_id)
        .fetch_one(db)
        .await?;
    validate_ease(&card, ease)?;

    let config = decks
        .config_for(card.deck_id)
        .cloned()
        .ok_or_else(|| Error::Library(LibraryError::Deck(crate::DeckErrorKind::NotFound(card.deck_id.to_string()))))?;
    let filtered_resched = if card.is_in_filtered_deck() {
        decks.get(card.deck_id).is_none_or(|d| d.filtered_resched)
    } else {
        true
    };
    let ctx = AnswerContext {
        now,
        today,
        day_cutoff,
        time_taken_ms,
        config: &config,
        filtered_resched,
    };

    bury_siblings(db, decks, session, &card, ctx.config, ctx.today).await?;

    card.reps += 1;
    let was_new_queue = card.queue == CardQueue::New;
    if was_new_queue {
        card.queue = CardQueue::Learning;
        if card.card_type == CardType::New {
            card.card_type = CardType::Learning;
        }
        card.left = starting_left(&ctx.config.new.0.delays, ctx.now.timestamp(), ctx.day_cutoff);
        if let Some(deck) = decks.get_mut(card.deck_id) {
            let counter = super::queues::bump_daily(deck.new_today(), ctx.today);
            deck.set_new_today(counter);
            decks.mark_dirty(card.deck_id);
        }
    }

    let ivl_before_answer = card.interval;

    let mut leeched = false;
    let (revlog_kind, new_ivl_for_log) = match card.queue {
        CardQueue::Learning | CardQueue::DayLearning => {
            let kind = answer_learning_card(&mut card, ease, &ctx, rng);
            if !was_new_queue {
                if let Some(deck) = decks.get_mut(card.deck_id) {
                    let counter = super::queues::bump_daily(deck.lrn_today(), ctx.today);
                    deck.set_lrn_today(counter);
                    decks.mark_dirty(card.deck_id);
                }
            }
            kind
        }
        CardQueue::Review => {
            let (kind, ivl, became_leech) = answer_review_card(db, &mut card, ease, &ctx, rng).await?;
            leeched = became_leech;
            if let Some(deck) = decks.get_mut(card.deck_id) {
                let counter = super::queues::bump_daily(deck.rev_today(), ctx.today);
                deck.set_rev_today(counter);
                decks.mark_dirty(card.deck_id);
            }
            (kind, ivl)
        }
        _ => {
            return Err(Error::Library(LibraryError::Scheduler(
                SchedulerErrorKind::InvalidState(u32::from(card.queue as i64 as u32)),
            )));
        }
    };

    card.modified = ctx.now.timestamp();
    card.usn = store::current_usn();

    persist_card(db, &card).await?;

    let clamped_time_ms = ctx.time_taken_ms.min(ctx.config.max_taken * 1000);
    let revlog = ReviewLog {
        id: store::next_timestamp_id(db, "revlog").await?,
        card_id: card.id,
        usn: store::current_usn(),
        ease: i64::from(ease),
        new_ivl: new_ivl_for_log,
        last_ivl: ivl_before_answer,
        factor: card.factor,
        time_taken_ms: clamped_time_ms,
        kind: revlog_kind,
    };
    insert_revlog(db, &revlog).await?;

    Ok((card, leeched))
}

fn validate_ease(card: &Card, ease: RatingId) -> Result<(), Error> {
    let max = match card.queue {
        CardQueue::Learning | CardQueue::DayLearning => 3,
        CardQueue::Review => 4,
        _ => {
            return Err(Error::Library(LibraryError::Scheduler(
                SchedulerErrorKind::InvalidState(u32::from(card.queue as i64 as u32)),
            )));
        }
    };
    if ease == 0 || ease > max {
        return Err(Error::Library(LibraryError::Scheduler(SchedulerErrorKind::InvalidRating(ease))));
    }
    Ok(())
}

/// §4.7: remove same-note cards from the in-memory new/review queues, and
/// persist `queue := Buried` for those whose deck config enables it.
async fn bury_siblings(
    db: &SqlitePool,
    decks: &mut DeckRegistry,
    session: &mut Session,
    answered: &Card,
    config: &DeckConfig,
    today: i64,
) -> Result<(), Error> {
    let siblings: Vec<Card> = sqlx::query_as("SELECT * FROM card WHERE note_id = ? AND id != ?")
        .bind(answered.note_id)
        .bind(answered.id)
        .fetch_all(db)
        .await?;
    for sibling in siblings {
        let eligible = sibling.queue == CardQueue::New || (sibling.queue == CardQueue::Review && sibling.due <= today);
        if !eligible {
            continue;
        }
        session.remove_from_new_and_review(sibling.id);
        let bury = match sibling.queue {
            CardQueue::New => config.new.0.bury,
            _ => config.rev.0.bury,
        };
        if bury {
            sqlx::query("UPDATE card SET queue = ? WHERE id = ?")
                .bind(CardQueue::Buried)
                .bind(sibling.id)
                .execute(db)
                .await?;
        }
        let _ = decks; // sibling's own deck counters are untouched by burying
    }
    Ok(())
}

/// §4.6.1. Returns the revlog kind and the interval/delay to record.
fn answer_learning_card(card: &mut Card, ease: RatingId, ctx: &AnswerContext<'_>, rng: &mut impl Rng) -> (RevlogType, i64) {
    let lapse_conf = &ctx.config.lapse.0;
    let new_conf = &ctx.config.new.0;
    let was_lapsed_review = card.card_type == CardType::Review;

    let kind = if card.is_in_filtered_deck() && card.card_type != CardType::New {
        RevlogType::Cram
    } else if was_lapsed_review {
        RevlogType::Relearn
    } else {
        RevlogType::Learning
    };

    match ease {
        3 => {
            // Easy: graduate immediately, early interval.
            reschedule_as_review(card, ctx.config, true, ctx.today, ctx.filtered_resched, rng);
            (kind, card.interval)
        }
        2 => {
            let remaining_steps = card.left % 1000;
            if remaining_steps - 1 <= 0 {
                reschedule_as_review(card, ctx.config, false, ctx.today, ctx.filtered_resched, rng);
                (kind, card.interval)
            } else {
                let steps_left = remaining_steps - 1;
                let today_completable =
                    super::interval::today_completable(&new_conf.delays, steps_left as usize, ctx.now.timestamp(), ctx.day_cutoff);
                card.left = steps_left + i64::from(today_completable) * 1000;
                let mut delay = step_delay_secs(&new_conf.delays, steps_left);
                if card.due < ctx.now.timestamp() {
                    delay = (delay as f64 * rng.gen_range(1.0..1.25)) as i64;
                }
                card.due = ctx.now.timestamp() + delay;
                enqueue_learning(card, ctx.day_cutoff, ctx.today);
                (kind, -delay)
            }
        }
        _ => {
            // Again: restart the step sequence.
            if was_lapsed_review && lapse_conf.mult > 0.0 {
                card.interval = (card.interval as f64 * lapse_conf.mult).floor().max(1.0).max(lapse_conf.min_int as f64) as i64;
            }
            if card.is_in_filtered_deck() {
                card.original_due = ctx.today + 1;
            }
            card.left = starting_left(&new_conf.delays, ctx.now.timestamp(), ctx.day_cutoff);
            let delay = step_delay_secs(&new_conf.delays, new_conf.delays.len() as i64);
            card.due = ctx.now.timestamp() + delay;
            enqueue_learning(card, ctx.day_cutoff, ctx.today);
            (kind, -delay)
        }
    }
}

fn enqueue_learning(card: &mut Card, day_cutoff: i64, today: i64) {
    if card.due < day_cutoff {
        card.queue = CardQueue::Learning;
    } else {
        let diff = card.due - day_cutoff;
        let days = diff / 86400 + i64::from(diff % 86400 != 0);
        card.due = today + days;
        card.queue = CardQueue::DayLearning;
    }
}

/// `_reschedule_as_review` (`spec.md` §4.6.1). `filtered_resched` is the
/// origin filtered deck's `resched` flag; when false and this is a new
/// card graduating (not a lapse), the card reverts to New instead of
/// being consumed by the filtered-deck study session.
fn reschedule_as_review(card: &mut Card, config: &DeckConfig, early: bool, today: i64, filtered_resched: bool, rng: &mut impl Rng) {
    let was_lapse = card.card_type == CardType::Review;
    let was_filtered = card.is_in_filtered_deck();
    if was_lapse {
        if filtered_resched {
            if was_filtered {
                card.interval = super::filtered::dyn_ivl_boost(card, today, config.rev.0.max_ivl);
            }
            card.due = (today + 1).max(card.original_due);
        } else {
            card.due = card.original_due;
        }
    } else {
        card.interval = graduating_interval(config, early, rng);
        card.due = today + card.interval;
        card.factor = config.new.0.initial_factor;
    }
    card.card_type = CardType::Review;
    card.queue = CardQueue::Review;

    if was_filtered {
        card.deck_id = card.original_deck_id;
        card.original_deck_id = 0;
        card.original_due = 0;
        if !filtered_resched && !was_lapse {
            card.card_type = CardType::New;
            card.queue = CardQueue::New;
        }
    }
}

/// `_answer_review_card` (`spec.md` §4.6.2). Returns the revlog kind, the
/// logged interval, and whether the lapse made this card a leech.
async fn answer_review_card(
    db: &SqlitePool,
    card: &mut Card,
    ease: RatingId,
    ctx: &AnswerContext<'_>,
    rng: &mut impl Rng,
) -> Result<(RevlogType, i64, bool), Error> {
    if ease == 1 {
        let became_leech = reschedule_lapse(db, card, ctx).await?;
        let delay = card.interval;
        return Ok((RevlogType::Review, -delay.abs(), became_leech));
    }

    let last_ivl = card.interval;
    let effective_due = if card.is_in_filtered_deck() { card.original_due } else { card.due };
    let delay = (ctx.today - effective_due).max(0);
    card.interval = super::interval::next_review_interval(last_ivl, card.factor, ease, delay, &ctx.config.rev.0);
    card.interval = constrain(card.interval as f64, ctx.config.rev.0.ivl_fct, last_ivl, ctx.config.rev.0.max_ivl);
    card.factor = updated_factor(card.factor, ease);
    card.due = ctx.today + card.interval;

    if card.is_in_filtered_deck() {
        card.deck_id = card.original_deck_id;
        card.original_deck_id = 0;
        card.original_due = 0;
    }

    Ok((RevlogType::Review, card.interval, false))
}

/// `_reschedule_lapse` (`spec.md` §4.6.3).
async fn reschedule_lapse(db: &SqlitePool, card: &mut Card, ctx: &AnswerContext<'_>) -> Result<bool, Error> {
    let lapse = &ctx.config.lapse.0;
    let last_ivl = card.interval;
    card.lapses += 1;
    card.interval = ((last_ivl as f64 * lapse.mult).floor() as i64).max(lapse.min_int);
    card.factor = (card.factor - 200).max(crate::model::FACTOR_MIN);
    card.due = ctx.today + card.interval;
    if card.is_in_filtered_deck() {
        card.original_due = card.due;
    }

    let mut became_leech = false;
    if leech::is_leech_trigger(card.lapses as u32, lapse.leech_fails) {
        became_leech = leech::apply_leech(db, card, lapse, card.note_id).await?;
    }
    if card.queue == CardQueue::Suspended {
        card.interval = 0;
        return Ok(became_leech);
    }

    if lapse.delays.is_empty() {
        card.interval = 0;
        return Ok(became_leech);
    }
    if card.original_due == 0 {
        card.original_due = card.due;
    }
    let delay = step_delay_secs(&lapse.delays, lapse.delays.len() as i64);
    card.due = ctx.now.timestamp() + delay;
    card.left = starting_left(&lapse.delays, ctx.now.timestamp(), ctx.day_cutoff);
    enqueue_learning(card, ctx.day_cutoff, ctx.today);
    card.interval = -delay;
    Ok(became_leech)
}

async fn persist_card(db: &SqlitePool, card: &Card) -> Result<(), Error> {
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

async fn insert_revlog(db: &SqlitePool, revlog: &ReviewLog) -> Result<(), Error> {
    store::retry_once(|| async {
        sqlx::query(
            "INSERT INTO revlog (id, card_id, usn, ease, new_ivl, last_ivl, factor, time_taken_ms, kind) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(revlog.id)
        .bind(revlog.card_id)
        .bind(revlog.usn)
        .bind(revlog.ease)
        .bind(revlog.new_ivl)
        .bind(revlog.last_ivl)
        .bind(revlog.factor)
        .bind(revlog.time_taken_ms)
        .bind(revlog.kind)
        .execute(db)
        .await
        .map_err(crate::Error::from)
    })
    .await?;
    Ok(())
}

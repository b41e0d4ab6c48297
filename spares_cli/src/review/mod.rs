//! Interactive study loop (`spec.md` §4.5-§4.7), driven directly against a
//! [`spares::collection::Collection`] rather than over HTTP: the CLI is one
//! of two façade front ends (the other is `spares_server`), and both talk to
//! the same in-process API.

mod utils;

use clap::Args;
use inquire::Select;
use spares::api::review::{answer_card, get_next_card, undo_review};
use spares::collection::Collection;
use spares::config::read_external_config;
use spares::model::{CardId, RatingId};
use spares::schema::card::CardsSelector;
use spares::schema::review::AnswerCardRequest;
use std::time::{Duration, Instant};
use strum::{EnumIter, IntoEnumIterator};
use strum_macros::{Display, EnumString};
use utils::{print_recall_duration, print_summary};

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Restrict studying to this deck (and its sub-decks); defaults to the
    /// collection's currently selected deck.
    #[arg(short, long)]
    pub deck_id: Option<i64>,
}

#[derive(Clone, Debug, Display, EnumIter, EnumString, PartialEq)]
enum ReviewAction {
    #[strum(to_string = "Rate: {description} ({id})")]
    Rate { id: RatingId, description: String },
    #[strum(serialize = "Bury")]
    Bury,
    #[strum(serialize = "Suspend")]
    Suspend,
    Exit,
}

fn ratings() -> Vec<ReviewAction> {
    [(1, "Again"), (2, "Hard"), (3, "Good"), (4, "Easy")]
        .into_iter()
        .map(|(id, description)| ReviewAction::Rate {
            id,
            description: description.to_string(),
        })
        .collect()
}

/// Drives the study loop to completion (or until the user exits).
pub async fn review_cards(review_args: ReviewArgs, collection: &mut Collection) -> Result<(), String> {
    let now = chrono::Utc::now();
    if let Some(deck_id) = review_args.deck_id {
        collection.config_mut().cur_deck = deck_id;
    }
    collection
        .reset_session(now)
        .await
        .map_err(|e| format!("{}", e))?;

    let autosave_interval_secs = read_external_config()
        .map_err(|e| format!("{}", e))?
        .autosave_interval_secs;

    let mut rng = rand::thread_rng();
    let mut all_options = ratings();
    all_options.push(ReviewAction::Bury);
    all_options.push(ReviewAction::Suspend);
    all_options.push(ReviewAction::Exit);

    let session_start = Instant::now();
    let mut session_recall = Duration::default();
    let mut reviewed_cards_count = 0;

    loop {
        let response = get_next_card(collection).await.map_err(|e| format!("{}", e))?;
        let Some(card) = response.card else {
            println!("Done");
            print_summary(session_start, session_recall, reviewed_cards_count);
            return Ok(());
        };
        println!();
        println!("Card Id: {}", card.id);
        println!("Note Id: {}", card.note_id);

        let recall_start = Instant::now();
        println!("Press Enter to reveal the answer...");
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);

        let recall_duration = recall_start.elapsed();
        print_recall_duration(recall_duration);
        session_recall += recall_duration;

        let mut select = Select::new("Action:", all_options.clone());
        select.vim_mode = true;
        let Ok(chosen_action) = select.prompt() else {
            print_summary(session_start, session_recall, reviewed_cards_count);
            return Ok(());
        };

        match chosen_action {
            ReviewAction::Rate { id: rating_id, .. } => {
                answer_card(
                    collection,
                    AnswerCardRequest {
                        card_id: card.id,
                        ease: rating_id,
                        time_taken_ms: recall_duration.as_millis() as i64,
                    },
                    &mut rng,
                )
                .await
                .map_err(|e| format!("{}", e))?;
                reviewed_cards_count += 1;
            }
            ReviewAction::Bury => {
                spares::api::card::bury_card(collection.pool(), card.id)
                    .await
                    .map_err(|e| format!("{}", e))?;
            }
            ReviewAction::Suspend => {
                spares::api::card::suspend_cards(collection.pool(), &CardsSelector::Ids(vec![card.id]))
                    .await
                    .map_err(|e| format!("{}", e))?;
            }
            ReviewAction::Exit => {
                print_summary(session_start, session_recall, reviewed_cards_count);
                return Ok(());
            }
        }

        if collection.autosave_due(chrono::Utc::now(), autosave_interval_secs) {
            collection.save().await.map_err(|e| format!("{}", e))?;
        }
    }
}

/// Undoes the last graded answer, restoring the affected card's prior
/// scheduling state (`spec.md` §4.10).
pub async fn undo_last(collection: &mut Collection) -> Result<Option<CardId>, String> {
    let response = undo_review(collection).await.map_err(|e| format!("{}", e))?;
    Ok(response.restored.map(|c| c.id))
}

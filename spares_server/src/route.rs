use crate::{
    AppState,
    handlers::{
        card::{bury_card_handler, get_card_handler, suspend_cards_handler, unbury_cards_handler, unsuspend_cards_handler},
        deck::{
            create_deck_handler, create_filtered_deck_handler, get_deck_handler, list_decks_handler,
            remove_deck_handler, rename_deck_handler,
        },
        health_check_handler,
        note::{create_note_handler, get_note_handler},
        notetype::{create_note_type_handler, get_note_type_handler},
        review::{answer_card_handler, get_next_card_handler, undo_review_handler},
        statistics::{due_counts_handler, fix_integrity_handler},
    },
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/healthcheck", get(health_check_handler))
        // Deck
        .route("/api/decks", post(create_deck_handler))
        .route("/api/decks", get(list_decks_handler))
        .route("/api/decks/:id", get(get_deck_handler))
        .route("/api/decks/filtered", post(create_filtered_deck_handler))
        .route("/api/decks/rename", patch(rename_deck_handler))
        .route("/api/decks/remove", post(remove_deck_handler))
        // Note type
        .route("/api/note_types", post(create_note_type_handler))
        .route("/api/note_types/:id", get(get_note_type_handler))
        // Note
        .route("/api/notes", post(create_note_handler))
        .route("/api/notes/:id", get(get_note_handler))
        // Card
        .route("/api/cards/:id", get(get_card_handler))
        .route("/api/cards/suspend", post(suspend_cards_handler))
        .route("/api/cards/unsuspend", post(unsuspend_cards_handler))
        .route("/api/cards/:id/bury", post(bury_card_handler))
        .route("/api/cards/unbury", post(unbury_cards_handler))
        // Review
        .route("/api/review/next", post(get_next_card_handler))
        .route("/api/review/answer", post(answer_card_handler))
        .route("/api/review/undo", post(undo_review_handler))
        // Statistics
        .route("/api/decks/:id/due_counts", get(due_counts_handler))
        .route("/api/maintenance/fix_integrity", post(fix_integrity_handler))
        .with_state(app_state)
}

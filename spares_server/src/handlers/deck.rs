use crate::{AppState, handlers::error_to_response};
use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use spares::api::deck::{create_deck, create_filtered_deck, get_deck, list_decks, remove_deck, rename_deck};
use spares::schema::deck::{CreateDeckRequest, CreateFilteredDeckRequest, RemoveDeckRequest, RenameDeckRequest};
use std::sync::Arc;

pub async fn create_deck_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<CreateDeckRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let pool = collection.pool().clone();
    let id = create_deck(&pool, &mut collection.decks, body)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "deck_id": id })))
}

pub async fn create_filtered_deck_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<CreateFilteredDeckRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let pool = collection.pool().clone();
    let id = create_filtered_deck(&pool, &mut collection.decks, body)
        .await
        .map_err(error_to_response)?;
    collection
        .rebuild_filtered(id, chrono::Utc::now())
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "deck_id": id })))
}

pub async fn rename_deck_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<RenameDeckRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    rename_deck(&mut collection.decks, body.deck_id, &body.new_name).map_err(error_to_response)?;
    Ok(StatusCode::OK)
}

pub async fn remove_deck_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<RemoveDeckRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let removed = remove_deck(&mut collection.decks, body.deck_id, body.cards_too, body.children_too)
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

pub async fn get_deck_handler(
    Path(deck_id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let today = collection.today(chrono::Utc::now());
    let deck = get_deck(&collection.decks, deck_id).map_err(error_to_response)?;
    Ok(Json(spares::schema::deck::DeckResponse::new(deck, today)))
}

pub async fn list_decks_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let today = collection.today(chrono::Utc::now());
    let decks_res = list_decks(&collection.decks, today);
    Ok(Json(decks_res))
}

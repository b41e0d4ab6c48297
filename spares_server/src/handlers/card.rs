use crate::{AppState, handlers::error_to_response};
use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use spares::api::card::{bury_card, get_card, suspend_cards, unbury_cards, unsuspend_cards};
use spares::schema::card::SuspendCardsRequest;
use std::sync::Arc;

pub async fn get_card_handler(
    Path(card_id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let card_res = get_card(collection.pool(), card_id)
        .await
        .map_err(error_to_response)?;
    Ok(Json(card_res))
}

pub async fn suspend_cards_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<SuspendCardsRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let n = suspend_cards(collection.pool(), &body.selector)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "suspended": n })))
}

pub async fn unsuspend_cards_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<SuspendCardsRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let n = unsuspend_cards(collection.pool(), &body.selector)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "unsuspended": n })))
}

pub async fn bury_card_handler(
    Path(card_id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    bury_card(collection.pool(), card_id)
        .await
        .map_err(error_to_response)?;
    Ok(StatusCode::OK)
}

pub async fn unbury_cards_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let n = unbury_cards(collection.pool(), None)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "unburied": n })))
}

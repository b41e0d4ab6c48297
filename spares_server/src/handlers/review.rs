use crate::{AppState, handlers::error_to_response};
use axum::{Json, http::StatusCode, response::IntoResponse};
use spares::api::review::{answer_card, get_next_card, undo_review};
use spares::schema::review::AnswerCardRequest;
use rand::SeedableRng;
use std::sync::Arc;

pub async fn get_next_card_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let response = get_next_card(&mut collection).await.map_err(error_to_response)?;
    Ok(Json(response))
}

pub async fn answer_card_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<AnswerCardRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let mut rng = rand::rngs::StdRng::from_entropy();
    let response = answer_card(&mut collection, body, &mut rng)
        .await
        .map_err(error_to_response)?;
    Ok(Json(response))
}

pub async fn undo_review_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let response = undo_review(&mut collection).await.map_err(error_to_response)?;
    Ok(Json(response))
}

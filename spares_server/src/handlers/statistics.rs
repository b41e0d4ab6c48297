use crate::{AppState, handlers::error_to_response};
use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use spares::api::statistics::due_counts;
use std::sync::Arc;

pub async fn due_counts_handler(
    Path(deck_id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let today = collection.today(chrono::Utc::now());
    let counts = due_counts(collection.pool(), deck_id, today)
        .await
        .map_err(error_to_response)?;
    Ok(Json(counts))
}

pub async fn fix_integrity_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let report = collection.fix_integrity().await.map_err(error_to_response)?;
    Ok(Json(serde_json::json!({
        "orphaned_cards_removed": report.orphaned_cards_removed,
        "orphaned_notes_removed": report.orphaned_notes_removed,
        "dues_clamped": report.dues_clamped,
        "intervals_clamped": report.intervals_clamped,
    })))
}

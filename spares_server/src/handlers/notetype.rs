use crate::{AppState, handlers::error_to_response};
use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use spares::api::notetype::get_note_type;
use spares::schema::notetype::CreateNoteTypeRequest;
use std::sync::Arc;

pub async fn create_note_type_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<CreateNoteTypeRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let id = collection
        .create_note_type(body)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "note_type_id": id })))
}

pub async fn get_note_type_handler(
    Path(id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let note_type_res = get_note_type(&collection.note_types, id).map_err(error_to_response)?;
    Ok(Json(note_type_res))
}

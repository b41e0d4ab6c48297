use crate::{AppState, handlers::error_to_response};
use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use spares::api::note::get_note;
use spares::render::PlaceholderRenderer;
use spares::schema::note::CreateNoteRequest;
use std::sync::Arc;

pub async fn create_note_handler(
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut collection = data.collection.lock().await;
    let note_type = collection
        .note_types
        .get(body.note_type_id)
        .ok_or_else(|| {
            error_to_response(spares::Error::Library(spares::LibraryError::NoteType(
                spares::NoteTypeErrorKind::NotFound(body.note_type_id.to_string()),
            )))
        })?;
    let renderer = PlaceholderRenderer::new(note_type.fields.0.clone());
    let (note_id, result) = collection
        .create_note(&renderer, body)
        .await
        .map_err(error_to_response)?;
    Ok(Json(serde_json::json!({ "note_id": note_id, "cards_created": result.created.len() })))
}

pub async fn get_note_handler(
    Path(id): Path<i64>,
    axum::extract::State(data): axum::extract::State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let collection = data.collection.lock().await;
    let note_res = get_note(collection.pool(), id).await.map_err(error_to_response)?;
    Ok(Json(note_res))
}

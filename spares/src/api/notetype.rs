//! Note type creation (`spec.md` §4.3), layered over
//! [`crate::notetypes::NoteTypeRegistry`].

use crate::model::{NoteType, NoteTypeId};
use crate::notetypes::NoteTypeRegistry;
use crate::schema::notetype::{CreateNoteTypeRequest, NoteTypeResponse};
use crate::store;
use crate::{Error, LibraryError, NoteTypeErrorKind};
use sqlx::types::Json;
use sqlx::SqlitePool;

pub async fn create_note_type(
    db: &SqlitePool,
    note_types: &mut NoteTypeRegistry,
    request: CreateNoteTypeRequest,
) -> Result<NoteTypeId, Error> {
    if request.fields.is_empty() {
        return Err(Error::Library(LibraryError::NoteType(NoteTypeErrorKind::EmptyFields)));
    }
    let now = chrono::Utc::now().timestamp();
    let note_type = NoteType {
        id: store::next_timestamp_id(db, "card").await?, // note types share no dedicated id sequence; the card clock is fine
        name: request.name,
        kind: request.kind,
        fields: Json(request.fields),
        templates: Json(request.templates),
        sort_field_idx: request.sort_field_idx as i64,
        default_deck_id: request.default_deck_id,
        requirements: None,
        modified: now,
        usn: store::current_usn(),
    };
    sqlx::query(
        r"INSERT INTO note_type (id, name, kind, fields, templates, sort_field_idx, default_deck_id, requirements, mod, usn)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(note_type.id)
    .bind(&note_type.name)
    .bind(note_type.kind)
    .bind(&note_type.fields)
    .bind(&note_type.templates)
    .bind(note_type.sort_field_idx)
    .bind(note_type.default_deck_id)
    .bind(&note_type.requirements)
    .bind(note_type.modified)
    .bind(note_type.usn)
    .execute(db)
    .await?;

    *note_types = NoteTypeRegistry::load(db).await?;
    Ok(note_type.id)
}

pub fn get_note_type(note_types: &NoteTypeRegistry, id: NoteTypeId) -> Result<NoteTypeResponse, Error> {
    note_types
        .get(id)
        .map(NoteTypeResponse::new)
        .ok_or_else(|| Error::Library(LibraryError::NoteType(NoteTypeErrorKind::NotFound(id.to_string()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardTemplate, NoteTypeKind};

    #[sqlx::test]
    async fn test_create_note_type_rejects_empty_fields(pool: SqlitePool) {
        let mut note_types = NoteTypeRegistry::load(&pool).await.unwrap();
        let result = create_note_type(
            &pool,
            &mut note_types,
            CreateNoteTypeRequest {
                name: "Basic".to_string(),
                kind: NoteTypeKind::Standard,
                fields: vec![],
                templates: vec![],
                sort_field_idx: 0,
                default_deck_id: 1,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[sqlx::test]
    async fn test_create_note_type_persists(pool: SqlitePool) {
        let mut note_types = NoteTypeRegistry::load(&pool).await.unwrap();
        let id = create_note_type(
            &pool,
            &mut note_types,
            CreateNoteTypeRequest {
                name: "Basic".to_string(),
                kind: NoteTypeKind::Standard,
                fields: vec!["Front".to_string(), "Back".to_string()],
                templates: vec![CardTemplate {
                    ord: 0,
                    name: "Card 1".to_string(),
                    question_format: "{{Front}}".to_string(),
                    answer_format: "{{Back}}".to_string(),
                    deck_override: None,
                }],
                sort_field_idx: 0,
                default_deck_id: 1,
            },
        )
        .await
        .unwrap();
        assert!(get_note_type(&note_types, id).is_ok());
    }
}

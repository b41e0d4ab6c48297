//! Note creation (`spec.md` §3, §4.4): stores fields/tags and immediately
//! materializes the note's cards.

use crate::decks::DeckRegistry;
use crate::materializer::{field_checksum, generate_cards, MaterializeResult};
use crate::model::{Note, NoteId, NoteTypeId};
use crate::notetypes::NoteTypeRegistry;
use crate::render::TemplateRenderer;
use crate::schema::note::{CreateNoteRequest, NoteResponse};
use crate::store;
use crate::{Error, LibraryError, NoteTypeErrorKind};
use sqlx::types::Json;
use sqlx::SqlitePool;

pub async fn create_note(
    db: &SqlitePool,
    decks: &mut DeckRegistry,
    note_types: &mut NoteTypeRegistry,
    renderer: &dyn TemplateRenderer,
    request: CreateNoteRequest,
    next_pos: &mut i64,
) -> Result<(NoteId, MaterializeResult), Error> {
    if note_types.get(request.note_type_id).is_none() {
        return Err(Error::Library(LibraryError::NoteType(NoteTypeErrorKind::NotFound(
            request.note_type_id.to_string(),
        ))));
    }
    let now = chrono::Utc::now().timestamp();
    let mut note = Note {
        id: store::next_timestamp_id(db, "note").await?,
        guid: uuid_like(now),
        note_type_id: request.note_type_id,
        modified: now,
        usn: store::current_usn(),
        tags: String::new(),
        fields: String::new(),
        sort_field: request.fields.first().cloned().unwrap_or_default(),
        checksum: field_checksum(request.fields.first().map_or("", String::as_str)),
        flags: 0,
        data: Json(request.custom_data),
    };
    note.set_field_list(&request.fields);
    note.set_tag_list(&request.tags);

    sqlx::query(
        r"INSERT INTO note (id, guid, note_type_id, mod, usn, tags, fields, sort_field, checksum, flags, data)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(note.id)
    .bind(&note.guid)
    .bind(note.note_type_id)
    .bind(note.modified)
    .bind(note.usn)
    .bind(&note.tags)
    .bind(&note.fields)
    .bind(&note.sort_field)
    .bind(note.checksum)
    .bind(note.flags)
    .bind(&note.data)
    .execute(db)
    .await?;

    let result = generate_cards(db, decks, note_types, renderer, &[note.id], next_pos).await?;
    Ok((note.id, result))
}

/// A millisecond-timestamp-derived id is already unique within this
/// process; `guid` only needs to be unique, not globally random, since
/// sync (where cross-collection guid collisions matter) is out of scope.
fn uuid_like(now: i64) -> String {
    format!("{now:x}")
}

pub async fn get_note(db: &SqlitePool, note_id: NoteId) -> Result<NoteResponse, Error> {
    let note: Note = sqlx::query_as("SELECT * FROM note WHERE id = ?")
        .bind(note_id)
        .fetch_one(db)
        .await?;
    Ok(NoteResponse::new(&note))
}

pub fn has_duplicate(existing_checksums: &[i64], first_field: &str) -> bool {
    existing_checksums.contains(&field_checksum(first_field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardTemplate, CustomData, NoteTypeKind};
    use crate::render::PlaceholderRenderer;

    async fn seed_note_type(pool: &SqlitePool) -> NoteTypeId {
        let id = store::next_timestamp_id(pool, "card").await.unwrap();
        sqlx::query(
            r"INSERT INTO note_type (id, name, kind, fields, templates, sort_field_idx, default_deck_id, requirements, mod, usn)
               VALUES (?, 'Basic', ?, ?, ?, 0, 1, NULL, 0, -1)",
        )
        .bind(id)
        .bind(NoteTypeKind::Standard)
        .bind(Json(vec!["Front".to_string(), "Back".to_string()]))
        .bind(Json(vec![CardTemplate {
            ord: 0,
            name: "Card 1".to_string(),
            question_format: "{{Front}}".to_string(),
            answer_format: "{{Back}}".to_string(),
            deck_override: None,
        }]))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[sqlx::test]
    async fn test_create_note_materializes_card(pool: SqlitePool) {
        let mut decks = DeckRegistry::load(&pool).await.unwrap();
        let mut note_types = NoteTypeRegistry::load(&pool).await.unwrap();
        let note_type_id = seed_note_type(&pool).await;
        note_types = NoteTypeRegistry::load(&pool).await.unwrap();
        let renderer = PlaceholderRenderer::new(vec!["Front".to_string(), "Back".to_string()]);
        let mut next_pos = 1;
        let (note_id, result) = create_note(
            &pool,
            &mut decks,
            &mut note_types,
            &renderer,
            CreateNoteRequest {
                note_type_id,
                deck_id: 1,
                fields: vec!["Q".to_string(), "A".to_string()],
                tags: vec!["demo".to_string()],
                custom_data: CustomData::new(),
            },
            &mut next_pos,
        )
        .await
        .unwrap();
        assert_eq!(result.created.len(), 1);
        let note = get_note(&pool, note_id).await.unwrap();
        assert_eq!(note.tags, vec!["demo".to_string()]);
    }
}

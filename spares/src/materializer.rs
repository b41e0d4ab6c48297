//! The card materializer (`spec.md` §4.4): given a set of notes, computes
//! the cards that should exist and removes the ones that no longer
//! should, without ever silently discarding review history.

use crate::decks::DeckRegistry;
use crate::model::{Card, CardId, NoteId, NoteType, NoteTypeKind};
use crate::notetypes::{NoteTypeRegistry, cloze_ordinals, compute_requirements};
use crate::render::TemplateRenderer;
use crate::store;
use crate::Error;
use itertools::Itertools;
use sqlx::SqlitePool;

pub struct MaterializeResult {
    pub created: Vec<CardId>,
    /// Cards whose ordinal is no longer available. The caller decides
    /// whether to delete them (`spec.md` §4.4 step 4).
    pub orphaned: Vec<CardId>,
}

/// `generate_cards(note_ids)` (`spec.md` §4.4).
pub async fn generate_cards(
    db: &SqlitePool,
    decks: &mut DeckRegistry,
    note_types: &mut NoteTypeRegistry,
    renderer: &dyn TemplateRenderer,
    note_ids: &[NoteId],
    next_pos: &mut i64,
) -> Result<MaterializeResult, Error> {
    let mut created = Vec::new();
    let mut orphaned = Vec::new();

    for &note_id in note_ids {
        let note: crate::model::Note = sqlx::query_as("SELECT * FROM note WHERE id = ?")
            .bind(note_id)
            .fetch_one(db)
            .await?;
        let note_type: NoteType = sqlx::query_as("SELECT * FROM note_type WHERE id = ?")
            .bind(note.note_type_id)
            .fetch_one(db)
            .await?;

        let existing: Vec<Card> = sqlx::query_as("SELECT * FROM card WHERE note_id = ?")
            .bind(note_id)
            .fetch_all(db)
            .await?;
        let existing_by_ord: std::collections::HashMap<i64, &Card> =
            existing.iter().map(|c| (c.template_ord, c)).collect();

        let representative_deck = existing.iter().map(|c| c.deck_id).all_equal_value().ok();
        let representative_due = existing.first().map(|c| c.due);

        let available_ordinals = available_ordinals(&note, &note_type, note_types, renderer)?;

        for ord in &available_ordinals {
            if existing_by_ord.contains_key(ord) {
                continue;
            }
            let deck_id = target_deck(decks, &note_type, *ord, representative_deck);
            let mut card = Card::new(note_id, deck_id, *ord, chrono::Utc::now().timestamp());
            card.id = store::next_timestamp_id(db, "card").await?;
            card.due = representative_due.unwrap_or_else(|| {
                let pos = *next_pos;
                *next_pos += 1;
                pos
            });
            insert_card(db, &card).await?;
            created.push(card.id);
        }

        for (&ord, card) in &existing_by_ord {
            if !available_ordinals.contains(&ord) {
                orphaned.push(card.id);
            }
        }
    }

    Ok(MaterializeResult { created, orphaned })
}

fn available_ordinals(
    note: &crate::model::Note,
    note_type: &NoteType,
    note_types: &mut NoteTypeRegistry,
    renderer: &dyn TemplateRenderer,
) -> Result<std::collections::HashSet<i64>, Error> {
    let fields = note.field_list();
    match note_type.kind {
        NoteTypeKind::Cloze => {
            let cloze_field_indices: Vec<usize> = (0..note_type.fields.0.len()).collect();
            Ok(cloze_ordinals(&fields, &cloze_field_indices)
                .into_iter()
                .map(i64::from)
                .collect())
        }
        NoteTypeKind::Standard => {
            let requirements = note_types
                .requirements(note_type.id, renderer)
                .unwrap_or_else(|_| compute_requirements(&note_type.fields.0, &note_type.templates.0, renderer));
            let mut ordinals = std::collections::HashSet::new();
            for (idx, requirement) in requirements.iter().enumerate() {
                let produces = match requirement {
                    crate::model::TemplateRequirementKind::None => false,
                    crate::model::TemplateRequirementKind::All(required) => {
                        required.iter().all(|&i| fields.get(i).is_some_and(|f| !f.is_empty()))
                    }
                    crate::model::TemplateRequirementKind::Any(sufficient) => {
                        sufficient.iter().any(|&i| fields.get(i).is_some_and(|f| !f.is_empty()))
                    }
                };
                if produces {
                    ordinals.insert(idx as i64);
                }
            }
            Ok(ordinals)
        }
    }
}

fn target_deck(
    decks: &DeckRegistry,
    note_type: &NoteType,
    ord: i64,
    representative_deck: Option<i64>,
) -> i64 {
    let candidate = note_type
        .templates
        .0
        .get(ord as usize)
        .and_then(|t| t.deck_override)
        .or(representative_deck)
        .unwrap_or(note_type.default_deck_id);
    match decks.get(candidate) {
        Some(deck) if deck.is_filtered => crate::model::DEFAULT_DECK_ID,
        Some(_) => candidate,
        None => crate::model::DEFAULT_DECK_ID,
    }
}

async fn insert_card(db: &SqlitePool, card: &Card) -> Result<(), Error> {
    sqlx::query(
        r"INSERT INTO card (id, note_id, deck_id, template_ord, type, queue, due, interval, factor,
           reps, lapses, left, original_due, original_deck_id, flags, mod, usn, data)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(card.id)
    .bind(card.note_id)
    .bind(card.deck_id)
    .bind(card.template_ord)
    .bind(card.card_type)
    .bind(card.queue)
    .bind(card.due)
    .bind(card.interval)
    .bind(card.factor)
    .bind(card.reps)
    .bind(card.lapses)
    .bind(card.left)
    .bind(card.original_due)
    .bind(card.original_deck_id)
    .bind(card.flags)
    .bind(card.modified)
    .bind(card.usn)
    .bind(&card.data)
    .execute(db)
    .await?;
    Ok(())
}

/// Checksum of a note's first field, used for duplicate detection
/// (`spec.md` §3 `Note.checksum`).
pub fn field_checksum(first_field: &str) -> i64 {
    let digest = sha256::digest(first_field.as_bytes());
    i64::from_str_radix(&digest[..15], 16).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_checksum_deterministic() {
        assert_eq!(field_checksum("hello"), field_checksum("hello"));
        assert_ne!(field_checksum("hello"), field_checksum("world"));
    }
}

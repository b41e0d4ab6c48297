//! Deck creation and management (`spec.md` §4.2), layered over
//! [`crate::decks::DeckRegistry`].

use crate::decks::DeckRegistry;
use crate::model::{Deck, DeckId, FilteredSearchTerm, DEFAULT_DECK_CONFIG_ID};
use crate::schema::deck::{CreateDeckRequest, CreateFilteredDeckRequest, DeckResponse, DecksResponse};
use crate::store;
use crate::{DeckErrorKind, Error, LibraryError};
use sqlx::SqlitePool;

pub async fn create_deck(db: &SqlitePool, decks: &mut DeckRegistry, request: CreateDeckRequest) -> Result<DeckId, Error> {
    decks.validate_not_nested_filtered(&request.name)?;
    let id = decks.ensure_deck(db, &request.name).await?;
    if let Some(config_id) = request.config_id {
        sqlx::query("UPDATE deck SET config_id = ? WHERE id = ?")
            .bind(config_id)
            .bind(id)
            .execute(db)
            .await?;
        *decks = DeckRegistry::load(db).await?;
    }
    Ok(id)
}

/// `createFilteredDeck` (`spec.md` §4.8): a filtered deck is never a parent
/// (or itself a child) of another filtered deck, and is created empty —
/// the caller invokes `rebuild` separately.
pub async fn create_filtered_deck(
    db: &SqlitePool,
    decks: &mut DeckRegistry,
    request: CreateFilteredDeckRequest,
) -> Result<DeckId, Error> {
    decks.validate_not_nested_filtered(&request.name)?;
    let id = decks.ensure_deck(db, &request.name).await?;
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "UPDATE deck SET is_filtered = 1, filtered_terms = ?, filtered_resched = ?, config_id = ?, mod = ?, usn = ? WHERE id = ?",
    )
    .bind(sqlx::types::Json(&request.terms))
    .bind(request.resched)
    .bind(DEFAULT_DECK_CONFIG_ID)
    .bind(now)
    .bind(store::current_usn())
    .bind(id)
    .execute(db)
    .await?;

    *decks = DeckRegistry::load(db).await?;
    Ok(id)
}

pub fn rename_deck(decks: &mut DeckRegistry, deck_id: DeckId, new_name: &str) -> Result<(), Error> {
    decks.rename(deck_id, new_name)
}

pub fn remove_deck(decks: &mut DeckRegistry, deck_id: DeckId, cards_too: bool, children_too: bool) -> Result<Vec<DeckId>, Error> {
    decks.remove(deck_id, cards_too, children_too)
}

pub fn get_deck(decks: &DeckRegistry, deck_id: DeckId) -> Result<&Deck, Error> {
    decks
        .get(deck_id)
        .ok_or_else(|| Error::Library(LibraryError::Deck(DeckErrorKind::NotFound(deck_id.to_string()))))
}

pub fn list_decks(decks: &DeckRegistry, today: i64) -> DecksResponse {
    DecksResponse {
        decks: decks.all().map(|d| DeckResponse::new(d, today)).collect(),
    }
}

/// `term.search` / `term.limit` / `term.order` live on the deck row itself
/// once created; this just validates the shape before storing it.
pub fn validate_filtered_terms(terms: &[FilteredSearchTerm]) -> Result<(), Error> {
    if terms.is_empty() {
        return Err(Error::Library(LibraryError::InvalidConfig(
            "A filtered deck needs at least one search term.".to_string(),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn test_create_deck_persists(pool: SqlitePool) {
        let mut decks = DeckRegistry::load(&pool).await.unwrap();
        let id = create_deck(
            &pool,
            &mut decks,
            CreateDeckRequest {
                name: "Spanish".to_string(),
                config_id: None,
            },
        )
        .await
        .unwrap();
        assert!(get_deck(&decks, id).is_ok());
    }

    #[test]
    fn test_validate_filtered_terms_rejects_empty() {
        assert!(validate_filtered_terms(&[]).is_err());
    }
}

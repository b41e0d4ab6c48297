//! The collection façade (`spec.md` §2, §5): owns the pool, the deck and
//! note-type registries, the scheduler session, and the undo log, and is
//! the only thing callers (the CLI, the server) talk to directly.

use crate::decks::DeckRegistry;
use crate::helpers::{day_cutoff, days_since_creation, four_am_local};
use crate::model::{CardId, CollectionConfig, CollectionRow, NoteId, NoteTypeId, RatingId};
use crate::notetypes::NoteTypeRegistry;
use crate::render::TemplateRenderer;
use crate::schedulers::sm2::{answer_card, Session};
use crate::schema::note::CreateNoteRequest;
use crate::schema::notetype::CreateNoteTypeRequest;
use crate::store;
use crate::undo::UndoLog;
use crate::{Error, LibraryError};
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// An open collection: one SQLite file, its in-memory registries, and the
/// current study session (`spec.md` §2 "the façade owns the store,
/// registries, and scheduler").
pub struct Collection {
    pool: SqlitePool,
    pub decks: DeckRegistry,
    pub note_types: NoteTypeRegistry,
    pub session: Session,
    pub undo: UndoLog,
    row: CollectionRow,
    dirty: bool,
    last_saved: DateTime<Utc>,
}

impl Collection {
    /// Opens `database_url`, running any pending migrations, and seeding a
    /// fresh `col` row if this is a brand-new database (`spec.md` §4.2).
    pub async fn open(database_url: &str) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| Error::Io {
            description: "Failed to apply migrations".to_string(),
            source: std::io::Error::other(e),
        })?;
        Self::load(pool).await
    }

    async fn load(pool: SqlitePool) -> Result<Self, Error> {
        let existing: Option<CollectionRow> = sqlx::query_as("SELECT * FROM col WHERE id = 1")
            .fetch_optional(&pool)
            .await?;
        let row = match existing {
            Some(row) => row,
            None => {
                let now = Utc::now();
                let crt = four_am_local(now);
                let row = CollectionRow {
                    id: 1,
                    crt: crt.timestamp(),
                    modified: now.timestamp(),
                    scm: now.timestamp_millis(),
                    usn: store::current_usn(),
                    ls: 0,
                    conf: sqlx::types::Json(CollectionConfig::default()),
                };
                sqlx::query("INSERT INTO col (id, crt, mod, scm, usn, ls, conf) VALUES (1, ?, ?, ?, ?, ?, ?)")
                    .bind(row.crt)
                    .bind(row.modified)
                    .bind(row.scm)
                    .bind(row.usn)
                    .bind(row.ls)
                    .bind(&row.conf)
                    .execute(&pool)
                    .await?;
                row
            }
        };

        let decks = DeckRegistry::load(&pool).await?;
        let note_types = NoteTypeRegistry::load(&pool).await?;

        Ok(Self {
            pool,
            decks,
            note_types,
            session: Session::default(),
            undo: UndoLog::default(),
            row,
            dirty: false,
            last_saved: Utc::now(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn crt(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.row.crt, 0).unwrap_or(Utc::now())
    }

    /// "Today" is the day number since collection creation (`spec.md` §4.2).
    pub fn today(&self, now: DateTime<Utc>) -> i64 {
        days_since_creation(now, self.crt())
    }

    pub fn day_cutoff(&self, today: i64) -> i64 {
        day_cutoff(self.crt(), today)
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.row.conf.0
    }

    pub fn config_mut(&mut self) -> &mut CollectionConfig {
        self.dirty = true;
        &mut self.row.conf.0
    }

    /// Rebuilds the study queues from store truth (`spec.md` §4.5).
    pub async fn reset_session(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        let today = self.today(now);
        let active = self.decks.active_ids(self.row.conf.0.cur_deck);
        self.session
            .reset(&self.pool, &self.decks, &active, today, now.timestamp())
            .await
    }

    /// `get_next_card` (`spec.md` §4.5). Starts the per-card timer the
    /// subsequent `answer_card` call requires.
    pub fn get_next_card(&mut self, now: DateTime<Utc>) -> Option<CardId> {
        let card_id = self
            .session
            .get_next_card(now.timestamp(), self.row.conf.0.collapse_time, &self.row.conf.0)?;
        self.session.timer_started.insert(card_id, now);
        Some(card_id)
    }

    /// `answer_card` (`spec.md` §4.6). Records the pre-answer card for undo
    /// before mutating it.
    pub async fn answer_card(
        &mut self,
        card_id: CardId,
        ease: RatingId,
        now: DateTime<Utc>,
        time_taken_ms: i64,
        rng: &mut impl Rng,
    ) -> Result<CardId, Error> {
        let today = self.today(now);
        let day_cutoff = self.day_cutoff(today);

        let before: crate::model::Card = sqlx::query_as("SELECT * FROM card WHERE id = ?")
            .bind(card_id)
            .fetch_one(&self.pool)
            .await?;
        let had_leech_tag = {
            let note: crate::model::Note = sqlx::query_as("SELECT * FROM note WHERE id = ?")
                .bind(before.note_id)
                .fetch_one(&self.pool)
                .await?;
            note.has_tag("leech")
        };

        let (card, became_leech) = answer_card(
            &self.pool,
            &mut self.decks,
            &mut self.session,
            card_id,
            ease,
            now,
            today,
            day_cutoff,
            time_taken_ms,
            rng,
        )
        .await?;

        self.undo.record(before, became_leech && !had_leech_tag);
        self.dirty = true;
        Ok(card.id)
    }

    /// `undo_review` (`spec.md` §4.10).
    pub async fn undo_last_review(&mut self, now: DateTime<Utc>) -> Result<CardId, Error> {
        let today = self.today(now);
        let card = self.undo.undo_review(&self.pool, today).await?;
        self.dirty = true;
        Ok(card.id)
    }

    /// `generate_cards` (`spec.md` §4.4).
    pub async fn generate_cards(
        &mut self,
        renderer: &dyn TemplateRenderer,
        note_ids: &[NoteId],
    ) -> Result<crate::materializer::MaterializeResult, Error> {
        let mut next_pos = self.row.conf.0.next_pos;
        let result = crate::materializer::generate_cards(
            &self.pool,
            &mut self.decks,
            &mut self.note_types,
            renderer,
            note_ids,
            &mut next_pos,
        )
        .await?;
        self.row.conf.0.next_pos = next_pos;
        self.dirty = true;
        Ok(result)
    }

    /// `createNote` (`spec.md` §4.4): inserts the note row, then
    /// materializes its cards, threading the same `next_pos` counter
    /// [`Self::generate_cards`] uses.
    pub async fn create_note(
        &mut self,
        renderer: &dyn TemplateRenderer,
        request: CreateNoteRequest,
    ) -> Result<(NoteId, crate::materializer::MaterializeResult), Error> {
        let mut next_pos = self.row.conf.0.next_pos;
        let result = crate::api::note::create_note(
            &self.pool,
            &mut self.decks,
            &mut self.note_types,
            renderer,
            request,
            &mut next_pos,
        )
        .await?;
        self.row.conf.0.next_pos = next_pos;
        self.dirty = true;
        Ok(result)
    }

    /// `createNoteType` (`spec.md` §4.3).
    pub async fn create_note_type(&mut self, request: CreateNoteTypeRequest) -> Result<NoteTypeId, Error> {
        crate::api::notetype::create_note_type(&self.pool, &mut self.note_types, request).await
    }

    /// `rebuild(did)` (`spec.md` §4.8).
    pub async fn rebuild_filtered(&mut self, deck_id: crate::model::DeckId, now: DateTime<Utc>) -> Result<usize, Error> {
        let today = self.today(now);
        let deck = self
            .decks
            .get(deck_id)
            .cloned()
            .ok_or_else(|| Error::Library(LibraryError::Deck(crate::DeckErrorKind::NotFound(deck_id.to_string()))))?;
        crate::schedulers::sm2::filtered::rebuild(&self.pool, &deck, today).await
    }

    pub async fn empty_filtered(&mut self, deck_id: crate::model::DeckId) -> Result<(), Error> {
        crate::schedulers::sm2::filtered::empty(&self.pool, deck_id).await
    }

    /// `fix_integrity` (`spec.md` §8 "the caller may invoke `fix_integrity`"):
    /// repairs the store, then
    /// reloads the in-memory registries from disk since the repair may
    /// have deleted decks' or note types' underlying rows out from under
    /// them.
    pub async fn fix_integrity(&mut self) -> Result<crate::integrity::IntegrityReport, Error> {
        let report = crate::integrity::fix_integrity(&self.pool).await?;
        self.decks = DeckRegistry::load(&self.pool).await?;
        self.note_types = NoteTypeRegistry::load(&self.pool).await?;
        Ok(report)
    }

    /// Flushes dirty deck rows and the `col` row if either changed since the
    /// last save (`spec.md` §5 "autosave"). Callers decide cadence; `close`
    /// always saves unconditionally first.
    pub async fn save(&mut self) -> Result<(), Error> {
        self.decks.flush(&self.pool).await?;
        if self.dirty {
            self.row.modified = Utc::now().timestamp();
            sqlx::query("UPDATE col SET mod = ?, conf = ? WHERE id = 1")
                .bind(self.row.modified)
                .bind(&self.row.conf)
                .execute(&self.pool)
                .await?;
            self.dirty = false;
        }
        self.last_saved = Utc::now();
        Ok(())
    }

    /// Whether `autosave_interval_secs` has elapsed since the last save
    /// (`spec.md` §5).
    pub fn autosave_due(&self, now: DateTime<Utc>, autosave_interval_secs: u64) -> bool {
        (now - self.last_saved).num_seconds() >= autosave_interval_secs as i64
    }

    /// `close(save)` (`spec.md` §5).
    pub async fn close(mut self, save: bool) -> Result<(), Error> {
        if save {
            self.save().await?;
        }
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_seeds_default_collection() {
        let collection = Collection::open("sqlite::memory:").await.unwrap();
        assert!(collection.decks.get(crate::model::DEFAULT_DECK_ID).is_some());
        assert_eq!(collection.config().cur_deck, crate::model::DEFAULT_DECK_ID);
    }

    #[tokio::test]
    async fn test_today_is_zero_on_creation_day() {
        let collection = Collection::open("sqlite::memory:").await.unwrap();
        let now = collection.crt() + chrono::Duration::hours(2);
        assert_eq!(collection.today(now), 0);
    }
}

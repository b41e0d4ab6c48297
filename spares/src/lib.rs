pub mod api;
pub mod collection;
pub mod config;
pub mod decks;
pub(crate) mod helpers;
pub mod integrity;
pub mod materializer;
pub mod model;
pub mod notetypes;
pub mod render;
pub mod schedulers;
pub mod schema;
pub mod search;
pub mod store;
pub mod undo;

use miette::Diagnostic;
use model::{CardId, DeckId, RatingId, StateId};
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Sqlx Error: {source}")]
    Sqlx { source: sqlx::Error },
    #[error("Io Error: {description}, {source}")]
    Io {
        description: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx { source }
    }
}

/// Note that `LibraryError` is `Clone` while `Error` is not: domain errors
/// are often inspected (e.g. by the undo log) after the originating
/// `sqlx`/`io` error has already been consumed by `?`.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum LibraryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Deck(#[from] DeckErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    NoteType(#[from] NoteTypeErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Card(#[from] CardErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchErrorKind),
    #[error("{0}")]
    InvalidConfig(String),
    #[error("A schema-modifying operation was attempted without confirmation.")]
    SchemaModAbort,
    #[error("Integrity error: {0}")]
    Integrity(String),
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum SchedulerErrorKind {
    #[error("No scheduler named `{0}` was found.")]
    NotFound(String),
    #[error("Card {0} is already buried.")]
    AlreadyBuried(CardId),
    #[error("Cannot bury a suspended card ({0}).")]
    Suspended(CardId),
    #[error("Card {0} was not returned by get_next_card in this session.")]
    NotInSession(CardId),
    #[error("Invalid rating. Received `{0}`.")]
    InvalidRating(RatingId),
    #[error("Invalid scheduler state. Received state `{0}`.")]
    InvalidState(StateId),
    #[error(
        "Consistency violation: card {0} has queue=Review and a nonzero original_due but no original_deck_id."
    )]
    DanglingOriginalDue(CardId),
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum DeckErrorKind {
    #[error("The default deck (id 1) cannot be deleted.")]
    CannotDeleteDefault,
    #[error("No deck named `{0}` was found.")]
    NotFound(String),
    #[error("Deck {0} is not a filtered deck.")]
    NotFiltered(DeckId),
    #[error("A filtered deck cannot be nested under another filtered deck.")]
    NestedFiltered,
    #[error("Deck names must not be empty.")]
    EmptyName,
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum NoteTypeErrorKind {
    #[error("No note type named `{0}` was found.")]
    NotFound(String),
    #[error("Template ordinal {0} does not exist on this note type.")]
    MissingTemplate(u32),
    #[error("Cloze note types must have at least one field.")]
    EmptyFields,
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum CardErrorKind {
    #[error("No card with id {0} was found.")]
    NotFound(CardId),
    #[error("Card {0}'s due value exceeds the defensive 2^32 bound.")]
    DueOutOfRange(CardId),
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum SearchErrorKind {
    #[error("Unknown search term: `{0}`.")]
    UnknownTerm(String),
    #[error("Malformed search query: {0}")]
    Malformed(String),
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilterOptions {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

pub mod deck {
    use crate::model::{Deck, DeckConfigId, DeckId, FilteredSearchTerm};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    pub struct CreateDeckRequest {
        pub name: String,
        pub config_id: Option<DeckConfigId>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct CreateFilteredDeckRequest {
        pub name: String,
        pub terms: Vec<FilteredSearchTerm>,
        pub resched: bool,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct RenameDeckRequest {
        pub deck_id: DeckId,
        pub new_name: String,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct RemoveDeckRequest {
        pub deck_id: DeckId,
        pub cards_too: bool,
        pub children_too: bool,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct DeckResponse {
        pub id: DeckId,
        pub name: String,
        pub config_id: DeckConfigId,
        pub is_filtered: bool,
        pub new_today: u32,
        pub rev_today: u32,
        pub lrn_today: u32,
    }

    impl DeckResponse {
        pub fn new(deck: &Deck, today: i64) -> Self {
            Self {
                id: deck.id,
                name: deck.name.clone(),
                config_id: deck.config_id,
                is_filtered: deck.is_filtered,
                new_today: deck.new_today().value_for(today),
                rev_today: deck.rev_today().value_for(today),
                lrn_today: deck.lrn_today().value_for(today),
            }
        }
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct DecksResponse {
        pub decks: Vec<DeckResponse>,
    }
}

pub mod notetype {
    use crate::model::{CardTemplate, NoteType, NoteTypeId, NoteTypeKind};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    pub struct CreateNoteTypeRequest {
        pub name: String,
        pub kind: NoteTypeKind,
        pub fields: Vec<String>,
        pub templates: Vec<CardTemplate>,
        pub sort_field_idx: usize,
        pub default_deck_id: i64,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct NoteTypeResponse {
        pub id: NoteTypeId,
        pub name: String,
        pub kind: NoteTypeKind,
        pub fields: Vec<String>,
        pub templates: Vec<CardTemplate>,
    }

    impl NoteTypeResponse {
        pub fn new(note_type: &NoteType) -> Self {
            Self {
                id: note_type.id,
                name: note_type.name.clone(),
                kind: note_type.kind,
                fields: note_type.fields.0.clone(),
                templates: note_type.templates.0.clone(),
            }
        }
    }
}

pub mod note {
    use crate::model::{CustomData, Note, NoteId, NoteTypeId};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    pub struct CreateNoteRequest {
        pub note_type_id: NoteTypeId,
        pub deck_id: i64,
        pub fields: Vec<String>,
        pub tags: Vec<String>,
        pub custom_data: CustomData,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct NoteResponse {
        pub id: NoteId,
        pub note_type_id: NoteTypeId,
        pub fields: Vec<String>,
        pub tags: Vec<String>,
        pub custom_data: CustomData,
    }

    impl NoteResponse {
        pub fn new(note: &Note) -> Self {
            Self {
                id: note.id,
                note_type_id: note.note_type_id,
                fields: note.field_list(),
                tags: note.tag_list(),
                custom_data: note.data.0.clone(),
            }
        }
    }
}

pub mod card {
    use crate::model::{Card, CardId, CardQueue, CardType, DeckId};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    pub enum CardsSelector {
        Ids(Vec<CardId>),
        Query(String),
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct SuspendCardsRequest {
        pub selector: CardsSelector,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct CardResponse {
        pub id: CardId,
        pub note_id: i64,
        pub deck_id: DeckId,
        pub card_type: CardType,
        pub queue: CardQueue,
        pub due: i64,
        pub interval: i64,
        pub factor: i64,
        pub reps: i64,
        pub lapses: i64,
    }

    impl CardResponse {
        pub fn new(card: &Card) -> Self {
            Self {
                id: card.id,
                note_id: card.note_id,
                deck_id: card.deck_id,
                card_type: card.card_type,
                queue: card.queue,
                due: card.due,
                interval: card.interval,
                factor: card.factor,
                reps: card.reps,
                lapses: card.lapses,
            }
        }
    }
}

pub mod review {
    use crate::model::{CardId, RatingId};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    pub struct GetNextCardResponse {
        pub card: Option<super::card::CardResponse>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct AnswerCardRequest {
        pub card_id: CardId,
        pub ease: RatingId,
        pub time_taken_ms: i64,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct AnswerCardResponse {
        pub card: super::card::CardResponse,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct UndoReviewResponse {
        pub restored: Option<super::card::CardResponse>,
    }
}

pub mod statistics {
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, Serialize)]
    pub struct DueCountsRequest {
        pub deck_id: i64,
    }

    #[derive(Clone, Debug, Deserialize, Serialize)]
    pub struct DueCountsResponse {
        pub new_count: u32,
        pub learning_count: u32,
        pub review_count: u32,
        pub counts_by_queue: HashMap<i64, u32>,
    }
}

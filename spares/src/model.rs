//! This file should match with the migrations file. These types should follow <https://docs.rs/sqlx/latest/sqlx/sqlite/types/index.html>.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use sqlx::types::Json;

pub type NoteId = i64;
pub type CardId = i64;
pub type DeckId = i64;
pub type DeckConfigId = i64;
pub type NoteTypeId = i64;
pub type RevlogId = i64;
pub type StateId = u32;
pub type RatingId = u32;
pub type CustomData = Map<String, Value>;

pub const DEFAULT_DECK_ID: DeckId = 1;
pub const DEFAULT_DECK_CONFIG_ID: DeckConfigId = 1;
pub const STARTING_FACTOR: i64 = 2500;
pub const FACTOR_MIN: i64 = 1300;
pub const NEW_CARD_STATE: StateId = 0;
/// Defensive bound against corrupt data.
pub const MAX_DUE: i64 = 1 << 32;
/// Value `due` is re-seated to during integrity repair when it exceeds `MAX_DUE`.
pub const INTEGRITY_REPAIR_DUE: i64 = 1_000_000;
/// Unit separator, between fields within a note's `fields` column.
pub const FIELD_SEPARATOR: char = '\u{1f}';

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, sqlx::Type)]
#[repr(i64)]
pub enum CardType {
    #[default]
    New = 0,
    Learning = 1,
    Review = 2,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, sqlx::Type)]
#[repr(i64)]
pub enum CardQueue {
    Suspended = -1,
    Buried = -2,
    #[default]
    New = 0,
    Learning = 1,
    Review = 2,
    DayLearning = 3,
}

impl CardQueue {
    /// `queue == Suspended || Buried` preserves `type`; restoration sets
    /// `queue := type`.
    pub fn is_special(self) -> bool {
        matches!(self, Self::Suspended | Self::Buried)
    }

    pub fn from_type(card_type: CardType) -> Self {
        match card_type {
            CardType::New => Self::New,
            CardType::Learning => Self::Learning,
            CardType::Review => Self::Review,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, sqlx::Type)]
#[repr(i64)]
pub enum RevlogType {
    #[default]
    Learning = 0,
    Review = 1,
    Relearn = 2,
    Cram = 3,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, sqlx::Type)]
#[repr(i64)]
pub enum GraveKind {
    Card = 0,
    Note = 1,
    Deck = 2,
}

/// The unit of study: one question/answer pair derived from a [`Note`]
/// through a template (or, for cloze note types, through a cloze number).
#[derive(Clone, Debug, Default, Deserialize, FromRow, Serialize)]
pub struct Card {
    pub id: CardId,
    pub note_id: NoteId,
    pub deck_id: DeckId,
    /// For `Standard` note types, the template ordinal that produced this
    /// card. For `Cloze` note types, the (0-based) cloze number.
    pub template_ord: i64,
    #[sqlx(rename = "type")]
    pub card_type: CardType,
    pub queue: CardQueue,
    /// New: insertion-order key. Review/DayLearning: day number since
    /// collection creation. Learning: Unix timestamp seconds.
    pub due: i64,
    /// Interval in days (review), or negative seconds while learning
    /// (matches the revlog convention).
    pub interval: i64,
    /// Ease factor in permille. `0` exactly for cards never reviewed.
    pub factor: i64,
    pub reps: i64,
    pub lapses: i64,
    /// `total_remaining_steps + today_completable_steps * 1000`.
    pub left: i64,
    /// Saved `due` while rehosted in a filtered deck. `0` if not rehosted.
    pub original_due: i64,
    /// Saved home deck while rehosted in a filtered deck. `0` if not rehosted.
    pub original_deck_id: DeckId,
    /// Low 3 bits: user flag (0-7). Higher bits reserved.
    pub flags: i64,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
    /// JSON data reserved for forward-compatible scheduler extensions.
    pub data: Json<CustomData>,
}

impl Card {
    pub fn new(note_id: NoteId, deck_id: DeckId, template_ord: i64, now: i64) -> Self {
        Self {
            id: 0,
            note_id,
            deck_id,
            template_ord,
            card_type: CardType::New,
            queue: CardQueue::New,
            due: 0,
            interval: 0,
            factor: 0,
            reps: 0,
            lapses: 0,
            left: 0,
            original_due: 0,
            original_deck_id: 0,
            flags: 0,
            modified: now,
            usn: -1,
            data: Json(Map::new()),
        }
    }

    /// `odid != 0` iff the card is currently in a filtered deck.
    pub fn is_in_filtered_deck(&self) -> bool {
        self.original_deck_id != 0
    }

    pub fn user_flag(&self) -> i64 {
        self.flags & 0b111
    }
}

/// The content bearer: one per fact, with fields; generates one or more
/// cards via a note type's templates.
#[derive(Clone, Debug, Default, Deserialize, FromRow, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub guid: String,
    pub note_type_id: NoteTypeId,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
    /// Space-prefixed-and-suffixed, e.g. `" tag-a tag-b "`, matching the
    /// on-disk convention so substring tag search stays simple.
    pub tags: String,
    /// `FIELD_SEPARATOR`-joined, in the note type's field order.
    pub fields: String,
    /// HTML-stripped copy of the configured sort field.
    pub sort_field: String,
    /// Checksum of field 0, for duplicate detection.
    pub checksum: i64,
    pub flags: i64,
    pub data: Json<CustomData>,
}

impl Note {
    pub fn field_list(&self) -> Vec<String> {
        self.fields.split(FIELD_SEPARATOR).map(str::to_owned).collect()
    }

    pub fn set_field_list(&mut self, fields: &[String]) {
        self.fields = fields.join(&FIELD_SEPARATOR.to_string());
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags.split_whitespace().map(str::to_owned).collect()
    }

    pub fn set_tag_list(&mut self, tags: &[String]) {
        if tags.is_empty() {
            self.tags = String::new();
        } else {
            self.tags = format!(" {} ", tags.join(" "));
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Per-deck daily counter: `(day_stamp, value)`, reset to zero lazily when
/// `day_stamp` no longer matches "today".
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DailyCounter {
    pub day: i64,
    pub count: u32,
}

impl DailyCounter {
    pub fn value_for(self, today: i64) -> u32 {
        if self.day == today { self.count } else { 0 }
    }

    pub fn increment(&mut self, today: i64, by: u32) {
        if self.day != today {
            self.day = today;
            self.count = 0;
        }
        self.count += by;
    }

    pub fn decrement(&mut self, today: i64, by: u32) {
        if self.day != today {
            self.day = today;
            self.count = 0;
            return;
        }
        self.count = self.count.saturating_sub(by);
    }
}

/// One search term of a filtered deck's rebuild query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FilteredSearchTerm {
    pub search: String,
    pub limit: u32,
    pub order: FilteredOrder,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FilteredOrder {
    Oldest,
    Random,
    SmallestInterval,
    LargestInterval,
    MostLapses,
    Added,
    ReverseAdded,
    Due,
    DuePriority,
}

/// A named, hierarchical (`::`-separated) bucket of cards.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    /// `0` for a normal deck backed by a [`DeckConfig`] row; otherwise the
    /// id of the shared config group.
    pub config_id: DeckConfigId,
    pub is_filtered: bool,
    /// Only meaningful when `is_filtered`.
    pub filtered_terms: Json<Vec<FilteredSearchTerm>>,
    pub filtered_resched: bool,
    pub new_today_day: i64,
    pub new_today_count: i64,
    pub rev_today_day: i64,
    pub rev_today_count: i64,
    pub lrn_today_day: i64,
    pub lrn_today_count: i64,
    pub time_today_day: i64,
    pub time_today_ms: i64,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
}

impl Deck {
    pub fn new_today(&self) -> DailyCounter {
        DailyCounter {
            day: self.new_today_day,
            count: self.new_today_count as u32,
        }
    }

    pub fn rev_today(&self) -> DailyCounter {
        DailyCounter {
            day: self.rev_today_day,
            count: self.rev_today_count as u32,
        }
    }

    pub fn lrn_today(&self) -> DailyCounter {
        DailyCounter {
            day: self.lrn_today_day,
            count: self.lrn_today_count as u32,
        }
    }

    pub fn set_new_today(&mut self, counter: DailyCounter) {
        self.new_today_day = counter.day;
        self.new_today_count = i64::from(counter.count);
    }

    pub fn set_rev_today(&mut self, counter: DailyCounter) {
        self.rev_today_day = counter.day;
        self.rev_today_count = i64::from(counter.count);
    }

    pub fn set_lrn_today(&mut self, counter: DailyCounter) {
        self.lrn_today_day = counter.day;
        self.lrn_today_count = i64::from(counter.count);
    }

    /// `"A::B::C"` -> `["A", "A::B", "A::B::C"]`.
    pub fn path_components(name: &str) -> Vec<String> {
        let mut acc = Vec::new();
        let parts: Vec<&str> = name.split("::").collect();
        for i in 1..=parts.len() {
            acc.push(parts[..i].join("::"));
        }
        acc
    }

    pub fn immediate_parent_name(name: &str) -> Option<String> {
        name.rsplit_once("::").map(|(parent, _)| parent.to_string())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum NewCardOrder {
    InOrder,
    Random,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LeechAction {
    Suspend,
    TagOnly,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewConfig {
    /// Learning-step delays, in minutes.
    pub delays: Vec<f64>,
    /// `[graduating, easy]` interval in days.
    pub ints: [i64; 2],
    pub initial_factor: i64,
    pub order: NewCardOrder,
    pub per_day: u32,
    pub bury: bool,
}

impl Default for NewConfig {
    fn default() -> Self {
        Self {
            delays: vec![1.0, 10.0],
            ints: [1, 4],
            initial_factor: STARTING_FACTOR,
            order: NewCardOrder::Random,
            per_day: 20,
            bury: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LapseConfig {
    pub delays: Vec<f64>,
    pub mult: f64,
    pub min_int: i64,
    pub leech_fails: u32,
    pub leech_action: LeechAction,
}

impl Default for LapseConfig {
    fn default() -> Self {
        Self {
            delays: vec![10.0],
            mult: 0.0,
            min_int: 1,
            leech_fails: 8,
            leech_action: LeechAction::Suspend,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReviewConfig {
    pub per_day: u32,
    pub ease4: f64,
    pub ivl_fct: f64,
    pub max_ivl: i64,
    pub bury: bool,
    pub hard_factor: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            per_day: 200,
            ease4: 1.3,
            ivl_fct: 1.0,
            max_ivl: 36500,
            bury: true,
            hard_factor: 1.2,
        }
    }
}

/// A shared configuration group (`dconf`), referenced by many decks.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct DeckConfig {
    pub id: DeckConfigId,
    pub name: String,
    pub new: Json<NewConfig>,
    pub lapse: Json<LapseConfig>,
    pub rev: Json<ReviewConfig>,
    /// Seconds.
    pub max_taken: i64,
    pub timer: bool,
    pub autoplay: bool,
    pub replayq: bool,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Default".to_string(),
            new: Json(NewConfig::default()),
            lapse: Json(LapseConfig::default()),
            rev: Json(ReviewConfig::default()),
            max_taken: 60,
            timer: false,
            autoplay: true,
            replayq: true,
            modified: 0,
            usn: -1,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, sqlx::Type)]
#[repr(i64)]
pub enum NoteTypeKind {
    Standard = 0,
    Cloze = 1,
}

/// One requirement-vector entry, computed by the template-requirement
/// analysis.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TemplateRequirementKind {
    /// The template produces no card regardless of field content.
    None,
    /// All listed fields must be non-empty.
    All(Vec<usize>),
    /// At least one listed field must be non-empty.
    Any(Vec<usize>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CardTemplate {
    pub ord: u32,
    pub name: String,
    pub question_format: String,
    pub answer_format: String,
    /// Overrides the note's/model's default deck for cards created from
    /// this template, if set.
    pub deck_override: Option<DeckId>,
}

/// A Standard (one template per card position) or Cloze (cards generated
/// per cloze-number) note type.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct NoteType {
    pub id: NoteTypeId,
    pub name: String,
    pub kind: NoteTypeKind,
    pub fields: Json<Vec<String>>,
    pub templates: Json<Vec<CardTemplate>>,
    pub sort_field_idx: i64,
    pub default_deck_id: DeckId,
    /// Computed by the requirement-vector analysis; `None` until first
    /// computed or after a template/field edit invalidates the cache.
    pub requirements: Option<Json<Vec<TemplateRequirementKind>>>,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
}

/// Append-only review history: one row per `answer_card` call.
#[derive(Clone, Debug, Default, Deserialize, FromRow, Serialize)]
pub struct ReviewLog {
    /// Millisecond-timestamp-derived, primary key.
    pub id: RevlogId,
    pub card_id: CardId,
    pub usn: i64,
    /// 1-4.
    pub ease: i64,
    /// Days positive, seconds negative for sub-day intervals.
    pub new_ivl: i64,
    pub last_ivl: i64,
    pub factor: i64,
    pub time_taken_ms: i64,
    pub kind: RevlogType,
}

/// Tombstone for a deleted card, note, or deck.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct Grave {
    pub usn: i64,
    pub oid: i64,
    pub kind: GraveKind,
}

/// The single-row `col` table: collection-wide state.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct CollectionRow {
    pub id: i64,
    /// Creation epoch, shifted to 4am local so late-night sessions count as
    /// the previous day.
    pub crt: i64,
    #[sqlx(rename = "mod")]
    pub modified: i64,
    pub scm: i64,
    pub usn: i64,
    pub ls: i64,
    pub conf: Json<CollectionConfig>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum NewSpread {
    Distribute,
    First,
    Last,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CollectionConfig {
    pub active_decks: Vec<DeckId>,
    pub cur_deck: DeckId,
    pub new_spread: NewSpread,
    /// Seconds: how far ahead learning cards are pulled into view to fill
    /// idle moments.
    pub collapse_time: i64,
    pub time_lim: i64,
    pub cur_model: Option<NoteTypeId>,
    /// Monotonically incrementing insertion-order key for new cards.
    pub next_pos: i64,
    pub sched_ver: u8,
    pub new_bury: bool,
    pub day_learn_first: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            active_decks: vec![DEFAULT_DECK_ID],
            cur_deck: DEFAULT_DECK_ID,
            new_spread: NewSpread::Distribute,
            collapse_time: 1200,
            time_lim: 0,
            cur_model: None,
            next_pos: 1,
            sched_ver: 2,
            new_bury: true,
            day_learn_first: false,
        }
    }
}

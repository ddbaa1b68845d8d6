use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::config::AppConfig;
use crate::search::{self, Debouncer, GridRequest, MAX_SUGGESTIONS};

/// Reducer clock period; the tick subscription runs at this interval.
pub const TICK_MS: u64 = 50;
/// Delay between cards appearing in the grid.
pub const CARD_STAGGER_MS: u64 = 100;
pub const MODAL_FADE_MS: u64 = 300;
pub const SHAKE_MS: u64 = 500;

pub const LOADING_BATCH_MESSAGE: &str = "Loading Pokémon...";
pub const SEARCHING_MESSAGE: &str = "Searching...";
pub const NOT_FOUND_MESSAGE: &str = "Pokémon not found. Try another name or ID.";
pub const BATCH_ERROR_MESSAGE: &str = "Failed to load Pokémon. Please try again later.";
pub const INIT_ERROR_MESSAGE: &str = "Failed to initialize app. Please try again later.";
pub const EMPTY_RESULT_MESSAGE: &str = "No Pokémon found.";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub value: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonAbility {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonRecord {
    pub id: u16,
    pub name: String,
    pub types: Vec<String>,
    pub stats: Vec<PokemonStat>,
    pub abilities: Vec<PokemonAbility>,
    /// Decimeters.
    pub height: u16,
    /// Hectograms.
    pub weight: u16,
    pub image_url: Option<String>,
}

impl PokemonRecord {
    pub fn base_stat(&self, name: &str) -> Option<u16> {
        self.stats
            .iter()
            .find(|stat| stat.name == name)
            .map(|stat| stat.value)
    }
}

/// A record with the weaknesses of its types resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonCard {
    pub record: PokemonRecord,
    pub weaknesses: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum GridView {
    #[default]
    Empty,
    Loading(String),
    Cards(Vec<PokemonCard>),
    Error(String),
}

impl GridView {
    pub fn cards(&self) -> &[PokemonCard] {
        match self {
            GridView::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GridView::Loading(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusArea {
    Search,
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitStatus {
    Pending,
    Ready,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalPhase {
    Opening { until: u64 },
    Open,
    Closing { remove_at: u64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub card: PokemonCard,
    pub phase: ModalPhase,
}

impl ModalState {
    pub fn is_closing(&self) -> bool {
        matches!(self.phase, ModalPhase::Closing { .. })
    }

    /// True while fading in or out.
    pub fn is_fading(&self) -> bool {
        !matches!(self.phase, ModalPhase::Open)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub suggestions: Vec<String>,
    pub suggestions_visible: bool,
    pub highlighted: Option<usize>,
    pub focused: bool,
    /// When set, suggestions hide at this clock time.
    pub hide_at: Option<u64>,
    pub debounce: Debouncer<GridRequest>,
}

impl SearchState {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            query: String::new(),
            suggestions: Vec::new(),
            suggestions_visible: false,
            highlighted: None,
            focused: true,
            hide_at: None,
            debounce: Debouncer::new(debounce_ms),
        }
    }

    /// Recomputes suggestions for the current query against `roster`.
    pub fn refresh_suggestions(&mut self, roster: &[String]) {
        self.suggestions = search::suggest(roster, &self.query, MAX_SUGGESTIONS);
        self.suggestions_visible = self.focused && !self.suggestions.is_empty();
        self.highlighted = self
            .highlighted
            .filter(|index| *index < self.suggestions.len());
    }

    pub fn hide_suggestions(&mut self) {
        self.suggestions_visible = false;
        self.highlighted = None;
        self.hide_at = None;
    }

    pub fn visible_suggestions(&self) -> &[String] {
        if self.suggestions_visible {
            &self.suggestions
        } else {
            &[]
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(search::DEBOUNCE_MS)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub clock_ms: u64,
    pub batch_size: usize,
    pub focus: FocusArea,
    pub init: InitStatus,
    pub roster: Vec<String>,
    pub search: SearchState,

    pub grid: GridView,
    /// Latest grid request; results tagged with an older one are dropped.
    pub generation: u64,
    pub revealed: usize,
    pub next_reveal_at: Option<u64>,
    pub selected_card: usize,
    pub modal: Option<ModalState>,
    pub shake_until: Option<u64>,
    pub message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            terminal_size: (80, 24),
            clock_ms: 0,
            batch_size: config.effective_batch_size(),
            focus: FocusArea::Search,
            init: InitStatus::Pending,
            roster: Vec::new(),
            search: SearchState::new(config.debounce_ms),
            grid: GridView::Empty,
            generation: 0,
            revealed: 0,
            next_reveal_at: None,
            selected_card: 0,
            modal: None,
            shake_until: None,
            message: None,
        }
    }

    /// Cards that have finished their staggered entrance.
    pub fn visible_cards(&self) -> &[PokemonCard] {
        let cards = self.grid.cards();
        &cards[..self.revealed.min(cards.len())]
    }

    pub fn selected(&self) -> Option<&PokemonCard> {
        self.visible_cards().get(self.selected_card)
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_until.is_some()
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Search")
                .entry("query", ron_string(&self.search.query))
                .entry("suggestions", ron_string(&self.search.visible_suggestions()))
                .entry("highlighted", ron_string(&self.search.highlighted))
                .entry("focused", ron_string(&self.search.focused))
                .entry("pending", ron_string(&self.search.debounce.pending()))
                .entry("due_at", ron_string(&self.search.debounce.due_at())),
            DebugSection::new("Grid")
                .entry("generation", ron_string(&self.generation))
                .entry("cards", ron_string(&self.grid.cards().len()))
                .entry("revealed", ron_string(&self.revealed))
                .entry("selected", ron_string(&self.selected_card))
                .entry(
                    "modal",
                    ron_string(&self.modal.as_ref().map(|modal| modal.card.record.name.clone())),
                ),
            DebugSection::new("Status")
                .entry("init", ron_string(&self.init))
                .entry("roster", ron_string(&self.roster.len()))
                .entry("clock_ms", ron_string(&self.clock_ms))
                .entry("shaking", ron_string(&self.is_shaking()))
                .entry("message", ron_string(&self.message)),
        ]
    }
}

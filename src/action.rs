use serde::{Deserialize, Serialize};

use crate::state::{FocusArea, PokemonCard};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,
    InitDidLoad { roster: Vec<String> },
    InitDidError(String),

    SearchQueryChange(String),
    SearchSubmit,
    SearchClear,

    SuggestionNext,
    SuggestionPrev,
    SuggestionPick(usize),

    BatchRefresh,
    BatchDidLoad { generation: u64, cards: Vec<PokemonCard> },
    BatchDidError { generation: u64, error: String },
    LookupDidLoad { generation: u64, card: PokemonCard },
    LookupDidError { generation: u64, error: String },

    CardNext,
    CardPrev,
    ModalOpen,
    ModalClose,

    FocusSet(FocusArea),

    UiTerminalResize(u16, u16),
    UiRender,
    Tick,
    Quit,
}

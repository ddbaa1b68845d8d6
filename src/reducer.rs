use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::search::{self, GridRequest, BLUR_GRACE_MS};
use crate::state::{
    AppState, FocusArea, GridView, InitStatus, ModalPhase, ModalState, PokemonCard,
    BATCH_ERROR_MESSAGE, CARD_STAGGER_MS, EMPTY_RESULT_MESSAGE, INIT_ERROR_MESSAGE,
    LOADING_BATCH_MESSAGE, MODAL_FADE_MS, NOT_FOUND_MESSAGE, SEARCHING_MESSAGE, SHAKE_MS,
    TICK_MS,
};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.init = InitStatus::Pending;
            state.grid = GridView::Loading(LOADING_BATCH_MESSAGE.to_string());
            state.message = None;
            DispatchResult::changed_with(Effect::Initialize)
        }

        Action::InitDidLoad { roster } => {
            state.init = InitStatus::Ready;
            state.roster = roster;
            state.search.refresh_suggestions(&state.roster);
            // Typing during startup may already have issued a request.
            if state.generation == 0 && !state.search.debounce.is_pending() {
                let effect = start_request(state, GridRequest::RandomBatch);
                DispatchResult::changed_with(effect)
            } else {
                DispatchResult::changed()
            }
        }

        Action::InitDidError(error) => {
            state.init = InitStatus::Failed;
            state.grid = GridView::Error(INIT_ERROR_MESSAGE.to_string());
            state.message = Some(error);
            DispatchResult::changed()
        }

        Action::SearchQueryChange(query) => {
            state.search.query = query;
            state.search.highlighted = None;
            state.search.hide_at = None;
            state.search.refresh_suggestions(&state.roster);
            match search::classify(&state.search.query).request() {
                // The keystroke landed somewhere inside the current tick.
                Some(request) => state
                    .search
                    .debounce
                    .schedule(state.clock_ms + TICK_MS, request),
                None => {
                    state.search.debounce.cancel();
                }
            }
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            if let Some(index) = state.search.highlighted {
                if state.search.suggestions_visible {
                    return reducer(state, Action::SuggestionPick(index));
                }
            }
            let request = state
                .search
                .debounce
                .flush()
                .or_else(|| search::classify(&state.search.query).request());
            match request {
                Some(request) => {
                    let effect = start_request(state, request);
                    DispatchResult::changed_with(effect)
                }
                None => DispatchResult::unchanged(),
            }
        }

        Action::SearchClear => reducer(state, Action::SearchQueryChange(String::new())),

        Action::SuggestionNext => {
            let count = state.search.visible_suggestions().len();
            if count == 0 {
                return DispatchResult::unchanged();
            }
            state.search.highlighted = Some(match state.search.highlighted {
                Some(index) => (index + 1) % count,
                None => 0,
            });
            DispatchResult::changed()
        }

        Action::SuggestionPrev => {
            let count = state.search.visible_suggestions().len();
            if count == 0 {
                return DispatchResult::unchanged();
            }
            state.search.highlighted = Some(match state.search.highlighted {
                Some(index) => (index + count - 1) % count,
                None => count - 1,
            });
            DispatchResult::changed()
        }

        Action::SuggestionPick(index) => {
            let Some(name) = state.search.visible_suggestions().get(index).cloned() else {
                return DispatchResult::unchanged();
            };
            state.search.query = search::display_name(&name);
            state.search.hide_suggestions();
            state.search.debounce.cancel();
            match search::classify(&state.search.query).request() {
                Some(request) => {
                    let effect = start_request(state, request);
                    DispatchResult::changed_with(effect)
                }
                None => DispatchResult::changed(),
            }
        }

        Action::BatchRefresh => {
            state.search.debounce.cancel();
            let effect = start_request(state, GridRequest::RandomBatch);
            DispatchResult::changed_with(effect)
        }

        Action::BatchDidLoad { generation, cards } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            show_cards(state, cards);
            DispatchResult::changed()
        }

        Action::BatchDidError { generation, error } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            show_error(state, BATCH_ERROR_MESSAGE, error);
            DispatchResult::changed()
        }

        Action::LookupDidLoad { generation, card } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            show_cards(state, vec![card]);
            state.search.hide_suggestions();
            DispatchResult::changed()
        }

        Action::LookupDidError { generation, error } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            show_error(state, NOT_FOUND_MESSAGE, error);
            DispatchResult::changed()
        }

        Action::CardNext => {
            if state.selected_card + 1 < state.visible_cards().len() {
                state.selected_card += 1;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::CardPrev => {
            if state.selected_card > 0 {
                state.selected_card -= 1;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::ModalOpen => {
            if state.modal.is_some() {
                return DispatchResult::unchanged();
            }
            let Some(card) = state.selected().cloned() else {
                return DispatchResult::unchanged();
            };
            state.modal = Some(ModalState {
                card,
                phase: ModalPhase::Opening {
                    until: state.clock_ms + MODAL_FADE_MS,
                },
            });
            DispatchResult::changed()
        }

        Action::ModalClose => match state.modal.as_mut() {
            Some(modal) if !modal.is_closing() => {
                modal.phase = ModalPhase::Closing {
                    remove_at: state.clock_ms + MODAL_FADE_MS,
                };
                DispatchResult::changed()
            }
            _ => DispatchResult::unchanged(),
        },

        Action::FocusSet(area) => {
            if state.focus == area {
                return DispatchResult::unchanged();
            }
            match area {
                FocusArea::Search => focus_search(state),
                FocusArea::Grid => blur_search(state),
            }
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::UiRender => DispatchResult::changed(),

        Action::Tick => tick(state),

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Advances the clock and fires whatever timers came due.
fn tick(state: &mut AppState) -> DispatchResult<Effect> {
    state.clock_ms += TICK_MS;
    let now = state.clock_ms;
    let mut changed = false;
    let mut effects = Vec::new();

    if let Some(request) = state.search.debounce.poll(now) {
        effects.push(start_request(state, request));
        changed = true;
    }

    if state.search.hide_at.is_some_and(|at| at <= now) {
        state.search.hide_suggestions();
        changed = true;
    }

    if let Some(at) = state.next_reveal_at {
        if at <= now {
            let total = state.grid.cards().len();
            state.revealed = (state.revealed + 1).min(total);
            state.next_reveal_at = (state.revealed < total).then_some(now + CARD_STAGGER_MS);
            changed = true;
        }
    }

    if let Some(until) = state.shake_until {
        if until <= now {
            state.shake_until = None;
        }
        changed = true;
    }

    if state.modal.as_ref().is_some_and(ModalState::is_fading) {
        match state.modal.as_ref().map(|modal| modal.phase) {
            Some(ModalPhase::Opening { until }) if until <= now => {
                if let Some(modal) = state.modal.as_mut() {
                    modal.phase = ModalPhase::Open;
                }
            }
            Some(ModalPhase::Closing { remove_at }) if remove_at <= now => state.modal = None,
            _ => {}
        }
        changed = true;
    }

    if state.grid.is_loading() {
        changed = true;
    }

    if !changed {
        DispatchResult::unchanged()
    } else if effects.is_empty() {
        DispatchResult::changed()
    } else {
        DispatchResult::changed_with_many(effects)
    }
}

/// Replaces the grid with a loading placeholder and tags the request with a
/// fresh generation.
fn start_request(state: &mut AppState, request: GridRequest) -> Effect {
    state.generation += 1;
    let generation = state.generation;
    state.revealed = 0;
    state.next_reveal_at = None;
    state.selected_card = 0;
    state.message = None;
    match request {
        GridRequest::RandomBatch => {
            state.grid = GridView::Loading(LOADING_BATCH_MESSAGE.to_string());
            Effect::LoadRandomBatch {
                count: state.batch_size,
                generation,
            }
        }
        GridRequest::Lookup(query) => {
            state.grid = GridView::Loading(SEARCHING_MESSAGE.to_string());
            Effect::LookupPokemon { query, generation }
        }
    }
}

fn show_cards(state: &mut AppState, cards: Vec<PokemonCard>) {
    state.selected_card = 0;
    if cards.is_empty() {
        state.grid = GridView::Error(EMPTY_RESULT_MESSAGE.to_string());
        state.revealed = 0;
        state.next_reveal_at = None;
        return;
    }
    state.revealed = 1;
    state.next_reveal_at = (cards.len() > 1).then_some(state.clock_ms + CARD_STAGGER_MS);
    state.grid = GridView::Cards(cards);
}

fn show_error(state: &mut AppState, message: &str, detail: String) {
    state.grid = GridView::Error(message.to_string());
    state.revealed = 0;
    state.next_reveal_at = None;
    state.shake_until = Some(state.clock_ms + SHAKE_MS);
    state.message = Some(detail);
}

fn focus_search(state: &mut AppState) {
    state.focus = FocusArea::Search;
    state.search.focused = true;
    state.search.hide_at = None;
    state.search.refresh_suggestions(&state.roster);
}

fn blur_search(state: &mut AppState) {
    state.focus = FocusArea::Grid;
    state.search.focused = false;
    state.search.hide_at = Some(state.clock_ms + BLUR_GRACE_MS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::DEBOUNCE_MS;
    use crate::state::{PokemonRecord, PokemonStat};

    fn roster() -> Vec<String> {
        ["bulbasaur", "pikachu", "raichu", "pidgey", "mew"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn ready_state() -> AppState {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(&mut state, Action::InitDidLoad { roster: roster() });
        state
    }

    fn card(id: u16, name: &str) -> PokemonCard {
        PokemonCard {
            record: PokemonRecord {
                id,
                name: name.to_string(),
                types: vec!["electric".into()],
                stats: vec![PokemonStat {
                    name: "hp".into(),
                    value: 35,
                }],
                abilities: Vec::new(),
                height: 4,
                weight: 60,
                image_url: None,
            },
            weaknesses: vec!["ground".into()],
        }
    }

    fn advance(state: &mut AppState, ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..ms / TICK_MS {
            effects.extend(reducer(state, Action::Tick).effects);
        }
        effects
    }

    #[test]
    fn test_init_requests_initialize() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::Init);
        assert!(result.changed);
        assert_eq!(result.effects, vec![Effect::Initialize]);
        assert!(state.grid.is_loading());
    }

    #[test]
    fn test_init_load_starts_random_batch() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        let result = reducer(&mut state, Action::InitDidLoad { roster: roster() });
        assert_eq!(
            result.effects,
            vec![Effect::LoadRandomBatch {
                count: 3,
                generation: 1
            }]
        );
        assert_eq!(state.init, InitStatus::Ready);
        assert_eq!(state.roster.len(), 5);
    }

    #[test]
    fn test_init_error_blocks_with_message() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(&mut state, Action::InitDidError("offline".into()));
        assert_eq!(state.init, InitStatus::Failed);
        assert_eq!(state.grid, GridView::Error(INIT_ERROR_MESSAGE.into()));
        assert_eq!(state.message.as_deref(), Some("offline"));
    }

    #[test]
    fn test_burst_of_input_fires_one_lookup() {
        let mut state = ready_state();
        let mut effects = Vec::new();
        for query in ["p", "pi", "pik", "pika"] {
            effects.extend(reducer(&mut state, Action::SearchQueryChange(query.into())).effects);
            effects.extend(advance(&mut state, 100));
        }
        assert!(effects.is_empty());

        effects.extend(advance(&mut state, 1_000));
        assert_eq!(
            effects,
            vec![Effect::LookupPokemon {
                query: "pika".into(),
                generation: 2
            }]
        );
        assert_eq!(state.grid, GridView::Loading(SEARCHING_MESSAGE.into()));
    }

    #[test]
    fn test_lookup_waits_for_quiet_period() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pik".into()));
        assert!(advance(&mut state, 300).is_empty());
        assert_eq!(advance(&mut state, 50).len(), 1);
    }

    #[test]
    fn test_lookup_never_fires_early_for_mid_tick_input() {
        let mut state = ready_state();
        advance(&mut state, 200);
        // Dispatched just before the next tick, so it really happened close
        // to clock + TICK_MS.
        let typed_at = state.clock_ms + TICK_MS - 5;
        reducer(&mut state, Action::SearchQueryChange("pik".into()));

        let mut fired_at = None;
        while fired_at.is_none() && state.clock_ms < 2_000 {
            let effects = reducer(&mut state, Action::Tick).effects;
            if effects
                .iter()
                .any(|effect| matches!(effect, Effect::LookupPokemon { .. }))
            {
                fired_at = Some(state.clock_ms);
            }
        }
        let fired_at = fired_at.expect("lookup never fired");
        assert!(fired_at - typed_at >= DEBOUNCE_MS, "fired {}ms after input", fired_at - typed_at);
    }

    #[test]
    fn test_input_inside_window_replaces_pending_lookup() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pik".into()));
        assert!(advance(&mut state, 250).is_empty());
        reducer(&mut state, Action::SearchQueryChange("pika".into()));

        let effects = advance(&mut state, 1_000);
        assert_eq!(
            effects,
            vec![Effect::LookupPokemon {
                query: "pika".into(),
                generation: 2
            }]
        );
    }

    #[test]
    fn test_short_query_only_suggests() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        assert_eq!(state.search.visible_suggestions(), ["pikachu", "pidgey"]);
        assert!(advance(&mut state, 1_000).is_empty());
        assert!(!state.search.debounce.is_pending());
    }

    #[test]
    fn test_short_query_cancels_pending_lookup() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pik".into()));
        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        assert!(advance(&mut state, 1_000).is_empty());
    }

    #[test]
    fn test_empty_query_hides_suggestions_and_requests_batch() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        assert!(state.search.suggestions_visible);

        reducer(&mut state, Action::SearchQueryChange(String::new()));
        assert!(!state.search.suggestions_visible);
        assert!(state.search.visible_suggestions().is_empty());

        let effects = advance(&mut state, DEBOUNCE_MS + TICK_MS);
        assert_eq!(
            effects,
            vec![Effect::LoadRandomBatch {
                count: 3,
                generation: 2
            }]
        );
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pikachu".into()));
        advance(&mut state, DEBOUNCE_MS + TICK_MS);
        reducer(&mut state, Action::SearchQueryChange("raichu".into()));
        advance(&mut state, DEBOUNCE_MS + TICK_MS);
        assert_eq!(state.generation, 3);

        let stale = reducer(
            &mut state,
            Action::LookupDidLoad {
                generation: 2,
                card: card(25, "pikachu"),
            },
        );
        assert!(!stale.changed);
        assert!(state.grid.is_loading());

        reducer(
            &mut state,
            Action::LookupDidLoad {
                generation: 3,
                card: card(26, "raichu"),
            },
        );
        assert_eq!(state.grid.cards()[0].record.name, "raichu");
    }

    #[test]
    fn test_lookup_error_shows_not_found_and_shakes() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("notapokemon".into()));
        advance(&mut state, DEBOUNCE_MS + TICK_MS);
        let generation = state.generation;
        reducer(
            &mut state,
            Action::LookupDidError {
                generation,
                error: "notapokemon not found".into(),
            },
        );
        assert_eq!(state.grid, GridView::Error(NOT_FOUND_MESSAGE.into()));
        assert!(state.is_shaking());

        advance(&mut state, SHAKE_MS);
        assert!(!state.is_shaking());
    }

    #[test]
    fn test_batch_error_abandons_whole_grid() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidError {
                generation: 1,
                error: "boom".into(),
            },
        );
        assert_eq!(state.grid, GridView::Error(BATCH_ERROR_MESSAGE.into()));
        assert!(state.visible_cards().is_empty());
    }

    #[test]
    fn test_cards_are_revealed_one_at_a_time() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![card(1, "bulbasaur"), card(25, "pikachu"), card(151, "mew")],
            },
        );
        assert_eq!(state.visible_cards().len(), 1);
        advance(&mut state, CARD_STAGGER_MS);
        assert_eq!(state.visible_cards().len(), 2);
        advance(&mut state, CARD_STAGGER_MS);
        assert_eq!(state.visible_cards().len(), 3);
        assert_eq!(state.next_reveal_at, None);
    }

    #[test]
    fn test_suggestion_pick_searches_immediately() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("chu".into()));
        reducer(&mut state, Action::SuggestionNext);
        reducer(&mut state, Action::SuggestionNext);
        assert_eq!(state.search.highlighted, Some(1));

        let result = reducer(&mut state, Action::SearchSubmit);
        assert_eq!(state.search.query, "Raichu");
        assert!(!state.search.suggestions_visible);
        assert_eq!(
            result.effects,
            vec![Effect::LookupPokemon {
                query: "raichu".into(),
                generation: 2
            }]
        );
        assert!(advance(&mut state, 1_000).is_empty());
    }

    #[test]
    fn test_submit_flushes_pending_lookup() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("mew".into()));
        let result = reducer(&mut state, Action::SearchSubmit);
        assert_eq!(
            result.effects,
            vec![Effect::LookupPokemon {
                query: "mew".into(),
                generation: 2
            }]
        );
        assert!(advance(&mut state, 1_000).is_empty());
    }

    #[test]
    fn test_blur_hides_after_grace_and_focus_reshows() {
        let mut state = ready_state();
        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        reducer(&mut state, Action::FocusSet(FocusArea::Grid));
        assert!(state.search.suggestions_visible);

        advance(&mut state, BLUR_GRACE_MS);
        assert!(!state.search.suggestions_visible);

        reducer(&mut state, Action::FocusSet(FocusArea::Search));
        assert!(state.search.suggestions_visible);
        assert_eq!(state.search.visible_suggestions().len(), 2);
    }

    #[test]
    fn test_modal_fades_in_and_out() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![card(25, "pikachu")],
            },
        );
        reducer(&mut state, Action::ModalOpen);
        assert!(state.modal.as_ref().is_some_and(|modal| modal.is_fading()));

        advance(&mut state, MODAL_FADE_MS);
        assert_eq!(state.modal.as_ref().map(|modal| modal.phase), Some(ModalPhase::Open));

        reducer(&mut state, Action::ModalClose);
        assert!(state.modal.as_ref().is_some_and(|modal| modal.is_closing()));
        advance(&mut state, MODAL_FADE_MS);
        assert!(state.modal.is_none());
    }

    #[test]
    fn test_card_selection_is_bounded_by_revealed_cards() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![card(1, "bulbasaur"), card(25, "pikachu")],
            },
        );
        assert!(!reducer(&mut state, Action::CardNext).changed);
        advance(&mut state, CARD_STAGGER_MS);
        assert!(reducer(&mut state, Action::CardNext).changed);
        assert_eq!(state.selected().map(|c| c.record.id), Some(25));
        assert!(reducer(&mut state, Action::CardPrev).changed);
    }

    #[test]
    fn test_open_modal_does_not_repaint_every_tick() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![card(25, "pikachu")],
            },
        );
        reducer(&mut state, Action::ModalOpen);
        assert!(reducer(&mut state, Action::Tick).changed);

        advance(&mut state, MODAL_FADE_MS);
        assert_eq!(state.modal.as_ref().map(|modal| modal.phase), Some(ModalPhase::Open));
        assert!(!reducer(&mut state, Action::Tick).changed);

        reducer(&mut state, Action::ModalClose);
        assert!(reducer(&mut state, Action::Tick).changed);
    }

    #[test]
    fn test_idle_tick_is_unchanged() {
        let mut state = ready_state();
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![card(25, "pikachu")],
            },
        );
        let result = reducer(&mut state, Action::Tick);
        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }
}

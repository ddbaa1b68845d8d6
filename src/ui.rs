use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{Component, EventKind, EventOutcome};
use tui_dispatch_components::{
    centered_rect, BaseStyle, BorderStyle, Modal, ModalBehavior, ModalProps, ModalStyle, Padding,
    StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection, StatusBarStyle,
    TextInput, TextInputProps, TextInputStyle,
};

use crate::action::Action;
use crate::search::display_name;
use crate::state::{
    AppState, FocusArea, GridView, InitStatus, ModalState, PokemonAbility, PokemonCard, TICK_MS,
};

const BG_BASE: Color = Color::Rgb(12, 18, 28);
const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
const ACCENT_RED: Color = Color::Rgb(244, 67, 54);

const STAT_HIGH: Color = Color::Rgb(76, 175, 80);
const STAT_MID: Color = Color::Rgb(255, 152, 0);
const STAT_LOW: Color = Color::Rgb(244, 67, 54);
const TYPE_UNKNOWN: Color = Color::Rgb(119, 119, 119);

const CARD_WIDTH: u16 = 28;
const CARD_HEIGHT: u16 = 10;
const STAT_BAR_WIDTH: usize = 20;
const STAT_MAX: u16 = 255;
const MODAL_WIDTH: u16 = 64;
const MODAL_HEIGHT: u16 = 28;
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct PokedexUi {
    search_input: TextInput,
    modal: Modal,
    status_bar: StatusBar,
}

impl Default for PokedexUi {
    fn default() -> Self {
        Self::new()
    }
}

impl PokedexUi {
    pub fn new() -> Self {
        Self {
            search_input: TextInput::new(),
            modal: Modal::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(CARD_HEIGHT),
                Constraint::Length(3),
            ])
            .split(area);

        render_search(frame, layout[0], state, &mut self.search_input);
        render_grid(frame, layout[1], state);
        render_footer(frame, layout[2], state, &mut self.status_bar);
        render_suggestions(frame, layout[0], area, state);

        if let Some(modal_state) = state.modal.as_ref() {
            render_modal(frame, area, modal_state, &mut self.modal);
        }
    }

    pub fn handle_event(&mut self, event: &EventKind, state: &AppState) -> EventOutcome<Action> {
        match event {
            EventKind::Resize(width, height) => {
                EventOutcome::action(Action::UiTerminalResize(*width, *height)).with_render()
            }
            EventKind::Key(key) => self.handle_key(*key, event, state),
            _ if state.modal.is_some() => self.handle_modal_event(event, state),
            _ => EventOutcome::ignored(),
        }
    }

    fn handle_key(
        &mut self,
        key: KeyEvent,
        event: &EventKind,
        state: &AppState,
    ) -> EventOutcome<Action> {
        if key.kind == KeyEventKind::Release {
            return EventOutcome::ignored();
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return EventOutcome::action(Action::Quit);
        }
        if state.modal.is_some() {
            return match key.code {
                KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('x') => {
                    EventOutcome::action(Action::ModalClose)
                }
                _ => self.handle_modal_event(event, state),
            };
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                let next = match state.focus {
                    FocusArea::Search => FocusArea::Grid,
                    FocusArea::Grid => FocusArea::Search,
                };
                return EventOutcome::action(Action::FocusSet(next));
            }
            _ => {}
        }
        match state.focus {
            FocusArea::Search => self.handle_search_key(key, event, state),
            FocusArea::Grid => handle_grid_key(key),
        }
    }

    fn handle_search_key(
        &mut self,
        key: KeyEvent,
        event: &EventKind,
        state: &AppState,
    ) -> EventOutcome<Action> {
        match key.code {
            KeyCode::Down => return EventOutcome::action(Action::SuggestionNext),
            KeyCode::Up => return EventOutcome::action(Action::SuggestionPrev),
            KeyCode::Enter => return EventOutcome::action(Action::SearchSubmit),
            KeyCode::Esc if state.search.query.is_empty() => {
                return EventOutcome::action(Action::FocusSet(FocusArea::Grid));
            }
            KeyCode::Esc => return EventOutcome::action(Action::SearchClear),
            _ => {}
        }
        let props = TextInputProps {
            value: &state.search.query,
            placeholder: "Search by name or ID...",
            is_focused: true,
            style: input_style(),
            on_change: Action::SearchQueryChange,
            on_submit: submit_search,
            on_cursor_move: Some(ui_render),
        };
        EventOutcome::from_actions(self.search_input.handle_event(event, props))
    }

    fn handle_modal_event(&mut self, event: &EventKind, state: &AppState) -> EventOutcome<Action> {
        let (width, height) = state.terminal_size;
        let mut noop_render = |_frame: &mut Frame, _area: Rect| {};
        let props = ModalProps {
            is_open: true,
            is_focused: true,
            area: modal_area(Rect::new(0, 0, width, height)),
            style: modal_style(false),
            behavior: ModalBehavior {
                close_on_esc: true,
                close_on_backdrop: true,
            },
            on_close: modal_close,
            render_content: &mut noop_render,
        };
        let actions: Vec<_> = self.modal.handle_event(event, props).into_iter().collect();
        EventOutcome::actions(actions)
    }
}

fn handle_grid_key(key: KeyEvent) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => EventOutcome::action(Action::CardPrev),
        KeyCode::Right | KeyCode::Char('l') => EventOutcome::action(Action::CardNext),
        KeyCode::Enter => EventOutcome::action(Action::ModalOpen),
        KeyCode::Char('/') => EventOutcome::action(Action::FocusSet(FocusArea::Search)),
        KeyCode::Char('r') => EventOutcome::action(Action::BatchRefresh),
        KeyCode::Char('q') | KeyCode::Esc => EventOutcome::action(Action::Quit),
        _ => EventOutcome::ignored(),
    }
}

fn render_search(frame: &mut Frame, area: Rect, state: &AppState, input: &mut TextInput) {
    let shaking = state.is_shaking();
    let area = if shaking && (state.clock_ms / TICK_MS) % 2 == 1 && area.width > 1 {
        Rect::new(area.x + 1, area.y, area.width - 1, area.height)
    } else {
        area
    };
    let is_focused = state.focus == FocusArea::Search;
    let border = if shaking {
        Style::default().fg(ACCENT_RED)
    } else {
        panel_border_style().style_for_focus(is_focused)
    };
    let block = Block::default()
        .title(" Search Pokémon ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(BG_PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let props = TextInputProps {
        value: &state.search.query,
        placeholder: "Search by name or ID...",
        is_focused,
        style: input_style(),
        on_change: Action::SearchQueryChange,
        on_submit: submit_search,
        on_cursor_move: Some(ui_render),
    };
    input.render(frame, inner, props);
}

/// Dropdown drawn over whatever sits below the search box.
fn render_suggestions(frame: &mut Frame, anchor: Rect, bounds: Rect, state: &AppState) {
    let suggestions = state.search.visible_suggestions();
    if suggestions.is_empty() {
        return;
    }
    let top = anchor.y + anchor.height;
    let height = (suggestions.len() as u16 + 2).min(bounds.bottom().saturating_sub(top));
    if height < 3 {
        return;
    }
    let area = Rect::new(anchor.x + 1, top, anchor.width.saturating_sub(2).min(40), height);

    let lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let style = if state.search.highlighted == Some(index) {
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT_MAIN)
            };
            Line::from(Span::styled(format!(" {} ", display_name(name)), style))
        })
        .collect();

    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT_TEAL))
        .style(Style::default().bg(BG_PANEL));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState) {
    let is_focused = state.focus == FocusArea::Grid;
    let block = Block::default()
        .title(" Pokédex ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(panel_border_style().style_for_focus(is_focused))
        .style(Style::default().bg(BG_BASE));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &state.grid {
        GridView::Empty => {
            render_placeholder(frame, inner, "Type a name or ID to search.", TEXT_DIM);
        }
        GridView::Loading(message) => {
            let frame_index = (state.clock_ms / TICK_MS) as usize % SPINNER.len();
            let text = format!("{} {}", SPINNER[frame_index], message);
            render_placeholder(frame, inner, &text, ACCENT_GOLD);
        }
        GridView::Error(message) => {
            render_placeholder(frame, inner, message, ACCENT_RED);
        }
        GridView::Cards(_) => render_cards(frame, inner, state, is_focused),
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    if area.height == 0 {
        return;
    }
    let row = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    let paragraph = Paragraph::new(Span::styled(text.to_string(), Style::default().fg(color)))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, row);
}

fn render_cards(frame: &mut Frame, area: Rect, state: &AppState, is_focused: bool) {
    let cards = state.visible_cards();
    let columns = (area.width / CARD_WIDTH).max(1) as usize;
    let rows_fit = (area.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = state.selected_card / columns;
    let first_row = selected_row.saturating_sub(rows_fit - 1);

    for (index, card) in cards.iter().enumerate() {
        let row = index / columns;
        if row < first_row || row >= first_row + rows_fit {
            continue;
        }
        let column = (index % columns) as u16;
        let y = area.y + (row - first_row) as u16 * CARD_HEIGHT;
        let x = area.x + column * CARD_WIDTH;
        let card_area = Rect::new(
            x,
            y,
            CARD_WIDTH.min(area.right().saturating_sub(x)),
            CARD_HEIGHT.min(area.bottom().saturating_sub(y)),
        );
        render_card(frame, card_area, card, is_focused && index == state.selected_card);
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &PokemonCard, is_selected: bool) {
    let record = &card.record;
    let border = if is_selected {
        Style::default().fg(ACCENT_GOLD).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(BG_PANEL));

    let stats = [("HP", "hp"), ("ATK", "attack"), ("DEF", "defense")];
    let mut stat_spans = Vec::new();
    for (label, name) in stats {
        let value = record.base_stat(name).unwrap_or(0);
        stat_spans.push(Span::styled(format!("{label} "), Style::default().fg(TEXT_DIM)));
        stat_spans.push(Span::styled(
            format!("{value:<4}"),
            Style::default()
                .fg(stat_color(value))
                .add_modifier(Modifier::BOLD),
        ));
    }

    let lines = vec![
        Line::from(Span::styled(
            display_name(&record.name),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format_dex_id(record.id), Style::default().fg(TEXT_DIM))),
        type_badges(&record.types),
        Line::from(stat_spans),
        Line::from(""),
        Line::from(Span::styled("Weaknesses", Style::default().fg(TEXT_DIM))),
        weakness_line(&card.weaknesses),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_modal(frame: &mut Frame, area: Rect, modal_state: &ModalState, modal: &mut Modal) {
    let fading = modal_state.is_fading();
    let card = &modal_state.card;
    let record = &card.record;
    let text_style = if fading {
        Style::default().fg(TEXT_MAIN).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(TEXT_MAIN)
    };
    let heading = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                display_name(&record.name),
                text_style.add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(format_dex_id(record.id), Style::default().fg(TEXT_DIM)),
        ]),
        Line::from(Span::styled(
            record.image_url.clone().unwrap_or_default(),
            Style::default().fg(TEXT_DIM),
        )),
        type_badges(&record.types),
        Line::from(""),
        Line::from(Span::styled("Stats", heading)),
    ];
    for stat in &record.stats {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", format_stat_name(&stat.name)), text_style),
            Span::styled(stat_bar(stat.value, STAT_BAR_WIDTH), Style::default().fg(STAT_HIGH)),
            Span::styled(format!(" {}", stat.value), text_style),
        ]));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled("Abilities", heading)),
        Line::from(Span::styled(format_abilities(&record.abilities), text_style)),
        Line::from(""),
        Line::from(Span::styled("Height & Weight", heading)),
        Line::from(Span::styled(
            format_height_weight(record.height, record.weight),
            text_style,
        )),
        Line::from(""),
        Line::from(Span::styled("Weaknesses", heading)),
        weakness_line(&card.weaknesses),
    ]);

    let mut render_content = |frame: &mut Frame, inner: Rect| {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        let body = Paragraph::new(Text::from(lines.clone())).wrap(Wrap { trim: false });
        frame.render_widget(body, layout[0]);
        let footer = Paragraph::new(Span::styled(
            "Enter/x: Close  |  Esc: Close",
            Style::default().fg(TEXT_DIM),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(footer, layout[1]);
    };

    let props = ModalProps {
        is_open: true,
        is_focused: !modal_state.is_closing(),
        area: modal_area(area),
        style: modal_style(fading),
        behavior: ModalBehavior {
            close_on_esc: true,
            close_on_backdrop: true,
        },
        on_close: modal_close,
        render_content: &mut render_content,
    };
    modal.render(frame, area, props);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.message.clone().unwrap_or_else(|| match state.init {
        InitStatus::Pending => "Loading roster...".to_string(),
        InitStatus::Failed => "Offline".to_string(),
        InitStatus::Ready => format!("{} Pokémon indexed", state.roster.len()),
    });
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(panel_border_style()),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.modal.is_some() {
        let left = vec![
            StatusBarHint::new("Enter/x", "Close"),
            StatusBarHint::new("Esc", "Close"),
        ];
        return (left, vec![StatusBarHint::new("Ctrl+C", "Quit")]);
    }
    let left = match state.focus {
        FocusArea::Search => vec![
            StatusBarHint::new("Up/Down", "Suggest"),
            StatusBarHint::new("Enter", "Search"),
            StatusBarHint::new("Esc", "Clear"),
        ],
        FocusArea::Grid => vec![
            StatusBarHint::new("h/l", "Move"),
            StatusBarHint::new("Enter", "Details"),
            StatusBarHint::new("r", "Random"),
            StatusBarHint::new("/", "Search"),
        ],
    };
    let center = vec![
        StatusBarHint::new("Tab", "Focus"),
        StatusBarHint::new("Ctrl+C", "Quit"),
    ];
    (left, center)
}

fn type_badges(types: &[String]) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, type_name) in types.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(type_badge(type_name));
    }
    Line::from(spans)
}

fn type_badge(type_name: &str) -> Span<'static> {
    Span::styled(
        format!(" {} ", display_name(type_name)),
        Style::default()
            .bg(type_color(type_name))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

fn weakness_line(weaknesses: &[String]) -> Line<'static> {
    if weaknesses.is_empty() {
        Line::from(Span::styled("None", Style::default().fg(TEXT_DIM)))
    } else {
        type_badges(weaknesses)
    }
}

pub fn type_color(type_name: &str) -> Color {
    match type_name {
        "normal" => Color::Rgb(168, 168, 120),
        "fire" => Color::Rgb(240, 128, 48),
        "water" => Color::Rgb(104, 144, 240),
        "electric" => Color::Rgb(248, 208, 48),
        "grass" => Color::Rgb(120, 200, 80),
        "ice" => Color::Rgb(152, 216, 216),
        "fighting" => Color::Rgb(192, 48, 40),
        "poison" => Color::Rgb(160, 64, 160),
        "ground" => Color::Rgb(224, 192, 104),
        "flying" => Color::Rgb(168, 144, 240),
        "psychic" => Color::Rgb(248, 88, 136),
        "bug" => Color::Rgb(168, 184, 32),
        "rock" => Color::Rgb(184, 160, 56),
        "ghost" => Color::Rgb(112, 88, 152),
        "dragon" => Color::Rgb(112, 56, 248),
        "dark" => Color::Rgb(112, 88, 72),
        "steel" => Color::Rgb(184, 184, 208),
        "fairy" => Color::Rgb(238, 153, 172),
        _ => TYPE_UNKNOWN,
    }
}

pub fn stat_color(value: u16) -> Color {
    if value > 80 {
        STAT_HIGH
    } else if value > 50 {
        STAT_MID
    } else {
        STAT_LOW
    }
}

/// `#025` style zero-padded id.
pub fn format_dex_id(id: u16) -> String {
    format!("#{id:03}")
}

/// Decimeters and hectograms to `0.40 m, 6.00 kg`.
pub fn format_height_weight(height: u16, weight: u16) -> String {
    format!(
        "{:.2} m, {:.2} kg",
        f64::from(height) / 10.0,
        f64::from(weight) / 10.0
    )
}

pub fn format_abilities(abilities: &[PokemonAbility]) -> String {
    abilities
        .iter()
        .map(|ability| {
            let name = title_case(&ability.name);
            if ability.is_hidden {
                format!("{name} (Hidden)")
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_stat_name(name: &str) -> String {
    title_case(name)
}

/// Bar of `width` cells filled in proportion to `value / 255`.
pub fn stat_bar(value: u16, width: usize) -> String {
    let filled = (usize::from(value.min(STAT_MAX)) * width + usize::from(STAT_MAX) / 2)
        / usize::from(STAT_MAX);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|word| !word.is_empty())
        .map(display_name)
        .collect::<Vec<_>>()
        .join(" ")
}

fn modal_area(area: Rect) -> Rect {
    centered_rect(
        MODAL_WIDTH.min(area.width),
        MODAL_HEIGHT.min(area.height),
        area,
    )
}

fn panel_border_style() -> BorderStyle {
    BorderStyle {
        borders: Borders::ALL,
        style: Style::default().fg(TEXT_DIM),
        focused_style: Some(Style::default().fg(ACCENT_TEAL)),
    }
}

fn input_style() -> TextInputStyle {
    TextInputStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        placeholder_style: Some(Style::default().fg(TEXT_DIM)),
        cursor_style: Some(Style::default().bg(ACCENT_GOLD).fg(BG_BASE)),
    }
}

fn modal_style(fading: bool) -> ModalStyle {
    ModalStyle {
        dim_factor: if fading { 0.3 } else { 0.6 },
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_GOLD)),
            }),
            padding: Padding::all(1),
            bg: Some(BG_PANEL),
            fg: None,
        },
    }
}

fn modal_close() -> Action {
    Action::ModalClose
}

fn ui_render(_: usize) -> Action {
    Action::UiRender
}

fn submit_search(_: String) -> Action {
    Action::SearchSubmit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reducer;
    use crate::state::{PokemonRecord, PokemonStat};
    use tui_dispatch::testing::*;

    fn pikachu() -> PokemonCard {
        PokemonCard {
            record: PokemonRecord {
                id: 25,
                name: "pikachu".into(),
                types: vec!["electric".into()],
                stats: vec![
                    PokemonStat {
                        name: "hp".into(),
                        value: 35,
                    },
                    PokemonStat {
                        name: "attack".into(),
                        value: 55,
                    },
                    PokemonStat {
                        name: "defense".into(),
                        value: 40,
                    },
                    PokemonStat {
                        name: "special-attack".into(),
                        value: 50,
                    },
                ],
                abilities: vec![
                    PokemonAbility {
                        name: "static".into(),
                        is_hidden: false,
                    },
                    PokemonAbility {
                        name: "lightning-rod".into(),
                        is_hidden: true,
                    },
                ],
                height: 4,
                weight: 60,
                image_url: Some("https://img/artwork/25.png".into()),
            },
            weaknesses: vec!["ground".into()],
        }
    }

    fn grid_state() -> AppState {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(
            &mut state,
            Action::InitDidLoad {
                roster: vec!["pikachu".into()],
            },
        );
        reducer(
            &mut state,
            Action::BatchDidLoad {
                generation: 1,
                cards: vec![pikachu()],
            },
        );
        reducer(&mut state, Action::FocusSet(FocusArea::Grid));
        state
    }

    fn press(code: KeyCode) -> EventKind {
        EventKind::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_format_height_weight() {
        assert_eq!(format_height_weight(4, 60), "0.40 m, 6.00 kg");
        assert_eq!(format_height_weight(17, 905), "1.70 m, 90.50 kg");
    }

    #[test]
    fn test_format_abilities_marks_hidden() {
        assert_eq!(
            format_abilities(&pikachu().record.abilities),
            "Static, Lightning Rod (Hidden)"
        );
        assert_eq!(format_abilities(&[]), "");
    }

    #[test]
    fn test_stat_color_thresholds() {
        assert_eq!(stat_color(81), STAT_HIGH);
        assert_eq!(stat_color(80), STAT_MID);
        assert_eq!(stat_color(51), STAT_MID);
        assert_eq!(stat_color(50), STAT_LOW);
    }

    #[test]
    fn test_type_color_falls_back_to_grey() {
        assert_eq!(type_color("electric"), Color::Rgb(248, 208, 48));
        assert_eq!(type_color("shadow"), TYPE_UNKNOWN);
    }

    #[test]
    fn test_stat_bar_scales_to_max() {
        assert_eq!(stat_bar(0, 10), "░".repeat(10));
        assert_eq!(stat_bar(255, 10), "█".repeat(10));
        assert_eq!(stat_bar(300, 10), "█".repeat(10));
        assert_eq!(stat_bar(51, 10).chars().filter(|c| *c == '█').count(), 2);
    }

    #[test]
    fn test_format_dex_id_pads() {
        assert_eq!(format_dex_id(25), "#025");
        assert_eq!(format_dex_id(151), "#151");
    }

    #[test]
    fn test_grid_keys() {
        let mut ui = PokedexUi::new();
        let state = grid_state();

        let actions = ui.handle_event(&EventKind::Key(key("r")), &state).actions;
        actions.assert_first(Action::BatchRefresh);

        let actions = ui.handle_event(&press(KeyCode::Enter), &state).actions;
        actions.assert_first(Action::ModalOpen);

        let actions = ui.handle_event(&press(KeyCode::Tab), &state).actions;
        actions.assert_first(Action::FocusSet(FocusArea::Search));
    }

    #[test]
    fn test_search_keys_route_to_suggestions() {
        let mut ui = PokedexUi::new();
        let state = AppState::default();

        let actions = ui.handle_event(&press(KeyCode::Down), &state).actions;
        actions.assert_first(Action::SuggestionNext);

        let actions = ui.handle_event(&press(KeyCode::Enter), &state).actions;
        actions.assert_first(Action::SearchSubmit);

        // Typing in the search box never quits.
        let actions = ui.handle_event(&EventKind::Key(key("q")), &state).actions;
        assert!(!actions.contains(&Action::Quit));
    }

    #[test]
    fn test_modal_close_key() {
        let mut ui = PokedexUi::new();
        let mut state = grid_state();
        reducer(&mut state, Action::ModalOpen);

        let actions = ui.handle_event(&EventKind::Key(key("x")), &state).actions;
        actions.assert_count(1);
        actions.assert_first(Action::ModalClose);
    }

    #[test]
    fn test_render_card() {
        let mut render = RenderHarness::new(80, 24);
        let mut ui = PokedexUi::new();
        let state = grid_state();

        let output = render.render_to_string_plain(|frame| {
            ui.render(frame, frame.area(), &state);
        });

        assert!(output.contains("Pikachu"), "missing name:\n{output}");
        assert!(output.contains("#025"));
        assert!(output.contains("Electric"));
        assert!(output.contains("Ground"));
    }

    #[test]
    fn test_render_modal_details() {
        let mut render = RenderHarness::new(100, 40);
        let mut ui = PokedexUi::new();
        let mut state = grid_state();
        reducer(&mut state, Action::ModalOpen);

        let output = render.render_to_string_plain(|frame| {
            ui.render(frame, frame.area(), &state);
        });

        assert!(output.contains("Static, Lightning Rod (Hidden)"));
        assert!(output.contains("0.40 m, 6.00 kg"));
        assert!(output.contains("Special Attack"));
    }

    #[test]
    fn test_render_error_placeholder() {
        let mut render = RenderHarness::new(80, 24);
        let mut ui = PokedexUi::new();
        let mut state = grid_state();
        reducer(&mut state, Action::SearchQueryChange("notapokemon".into()));
        reducer(&mut state, Action::SearchSubmit);
        let generation = state.generation;
        reducer(
            &mut state,
            Action::LookupDidError {
                generation,
                error: "notapokemon not found".into(),
            },
        );

        let output = render.render_to_string_plain(|frame| {
            ui.render(frame, frame.area(), &state);
        });

        assert!(output.contains("Pokémon not found. Try another name or ID."));
    }
}

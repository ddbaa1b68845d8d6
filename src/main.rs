use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventOutcome, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem};

use pokefinder::action::Action;
use pokefinder::api::{PokeApiClient, API_BASE};
use pokefinder::config::AppConfig;
use pokefinder::effect::Effect;
use pokefinder::reducer::reducer;
use pokefinder::search::{DEBOUNCE_MS, RANDOM_BATCH_SIZE, ROSTER_SIZE};
use pokefinder::service::PokedexService;
use pokefinder::state::{AppState, TICK_MS};
use pokefinder::ui::PokedexUi;

#[derive(Parser, Debug)]
#[command(name = "pokefinder")]
#[command(about = "Search the first-generation Pokédex from the terminal")]
struct Args {
    #[command(flatten)]
    debug: DebugCliArgs,
    #[arg(long, default_value = API_BASE)]
    api_base: String,
    /// Pokémon shown for an empty search box
    #[arg(long, default_value_t = RANDOM_BATCH_SIZE)]
    batch_size: usize,
    #[arg(long, default_value_t = DEBOUNCE_MS)]
    debounce_ms: u64,
    /// Write tracing output to this file; logging is off without it
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> AppConfig {
        AppConfig {
            api_base: self.api_base.clone(),
            batch_size: self.batch_size,
            debounce_ms: self.debounce_ms,
            roster_limit: ROSTER_SIZE as usize,
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let config = args.config();
    init_logging(&config)?;

    let debug = DebugSession::new(args.debug);
    let client = PokeApiClient::new(config.api_base.clone());
    let service = Arc::new(
        PokedexService::new(Arc::new(client)).with_roster_limit(config.roster_limit),
    );

    let state = debug
        .load_state_or_else_async(|| {
            let config = config.clone();
            async move { Ok::<AppState, io::Error>(AppState::new(&config)) }
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, service).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

/// Installs a file-backed subscriber when `--log-file` is set. The terminal is
/// owned by the UI, so nothing is logged to stdout or stderr.
fn init_logging(config: &AppConfig) -> io::Result<()> {
    let Some(path) = config.log_file.as_ref() else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let log_filter = format!("pokefinder={}", config.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    tracing::info!(api_base = %config.api_base, "pokefinder starting");
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    service: Arc<PokedexService>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(PokedexUi::new()));
    let ui_events = Rc::clone(&ui);
    debug
        .run_effect_app(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(TICK_MS), || Action::Tick);
            },
            |frame, area, state, _render_ctx: RenderContext| {
                ui.borrow_mut().render(frame, area, state);
            },
            move |event, state| -> EventOutcome<Action> {
                ui_events.borrow_mut().handle_event(event, state)
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, service.clone()),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, service: Arc<PokedexService>) {
    match effect {
        Effect::Initialize => {
            ctx.tasks().spawn(TaskKey::new("init"), async move {
                match service.initialize().await {
                    Ok(roster) => Action::InitDidLoad { roster },
                    Err(error) => {
                        tracing::error!(%error, "initialization failed");
                        Action::InitDidError(error.to_string())
                    }
                }
            });
        }
        Effect::LoadRandomBatch { count, generation } => {
            let key = format!("grid_{generation}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match service.fetch_random_cards(count).await {
                    Ok(cards) => Action::BatchDidLoad { generation, cards },
                    Err(error) => Action::BatchDidError {
                        generation,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::LookupPokemon { query, generation } => {
            let key = format!("grid_{generation}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match service.fetch_card(&query).await {
                    Ok(card) => Action::LookupDidLoad { generation, card },
                    Err(error) => Action::LookupDidError {
                        generation,
                        error: error.to_string(),
                    },
                }
            });
        }
    }
}

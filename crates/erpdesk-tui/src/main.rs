//! erpdesk - a terminal console for the ERP admin user directory.
//!
//! Browse, edit and add user profiles held by the profile service, with a
//! dashboard overview and spreadsheet export.

mod app;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use erpdesk_core::api::ProfileClient;
use erpdesk_core::auth::SessionStore;
use erpdesk_core::config::Config;
use erpdesk_core::export::export_roster;
use erpdesk_core::storage::LocalStorage;
use erpdesk_core::store::DirectoryStore;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix in the data directory
const LOG_FILE: &str = "erpdesk.log";

/// Initialize the tracing subscriber, writing to a daily log file so the
/// terminal UI is left alone. Use RUST_LOG to change the level.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            Config::default()
        }
    };
    let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let _log_guard = init_tracing(&data_dir);
    info!(api = %config.api_base_url(), "erpdesk starting");

    let gateway = Arc::new(
        ProfileClient::new(config.api_base_url(), config.request_timeout())
            .context("Failed to build HTTP client")?,
    );

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--export" {
        let dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| config.export_dir());
        return export_headless(&config, gateway, &dir).await;
    }

    let storage = LocalStorage::open(&data_dir)?;
    info!(path = %storage.path().display(), "Local storage opened");
    let session = SessionStore::new(storage);

    let mut app = App::new(config, session, gateway);
    match Config::default_path() {
        Ok(path) => app = app.with_config_path(path),
        Err(e) => warn!(error = %e, "Config changes will not be saved"),
    }

    if app.is_authenticated() {
        app.load_directory();
    } else {
        app.start_login();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("erpdesk shutting down");
    Ok(())
}

/// Load the roster and write the spreadsheet without starting the UI
async fn export_headless(config: &Config, gateway: Arc<ProfileClient>, dir: &Path) -> Result<()> {
    let mut store = DirectoryStore::new(gateway, config.write_policy);
    store.initialize().await;

    for note in store.directory_mut().take_notifications() {
        eprintln!("{}", note.message);
    }

    let roster = store.directory().roster();
    let path = export_roster(roster, dir).context("Export failed")?;
    eprintln!("Exported {} users to {}", roster.len(), path.display());
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Apply results of finished background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

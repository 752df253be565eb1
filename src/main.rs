use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use capi_app::App;
use capi_completion::{KeywordDb, SemanticService};
use capi_config::{get_cache_dir, Config};
use capi_logger::LogLevel;
use capi_theme::set_themes_dir;

/// In-memory log entries kept for Help > Show Log.
const MAX_LOG_ENTRIES: usize = 1000;

fn log_file_path(config: &Config) -> PathBuf {
    match &config.logging.file_path {
        Some(path) => PathBuf::from(path),
        None => get_cache_dir()
            .map(|dir| dir.join("capi.log"))
            .unwrap_or_else(|_| std::env::temp_dir().join("capi.log")),
    }
}

fn main() -> Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let min_level = config
        .logging
        .min_level
        .parse::<LogLevel>()
        .unwrap_or(LogLevel::Info);
    capi_logger::init(log_file_path(&config), MAX_LOG_ENTRIES, min_level);
    log::info!("Capi Editor {} starting", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        log::error!("Using default settings: {:#}", e);
    }

    if let Ok(themes_dir) = Config::themes_dir() {
        set_themes_dir(themes_dir);
    }
    let keywords = match Config::keywords_file_path() {
        Ok(path) => KeywordDb::load(&path),
        Err(_) => KeywordDb::embedded(),
    };

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Arc::new(keywords));
    app.restore_session();
    let result = app.run(&mut terminal);
    SemanticService::global().shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("{:#}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

mod app;
mod cli;
mod commands;
mod config;
mod event;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use cli::{Cli, Commands};
use config::Config;
use event::{Event, EventHandler};

const LOG_ENV: &str = "STTLAYOUT_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The editor owns the terminal, so its logs go to a file. When no log file
/// can be opened the editor runs without one.
fn init_file_logging(config: &Config) {
    let Some((file, path)) = config::open_log_file(config.log_candidates()) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    if path != config.log_file {
        warn!(wanted = %config.log_file.display(), path = %path.display(), "log file fallback");
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Edit { file: None }) {
        Commands::Edit { file } => {
            init_file_logging(&config);
            run_editor(&config, file.as_deref())
        }
        Commands::Check { file } => {
            init_stderr_logging();
            commands::check(&file)
        }
        Commands::Fmt { file, output } => {
            init_stderr_logging();
            commands::fmt(&file, output.as_deref())
        }
    }
}

fn run_editor(config: &Config, file: Option<&Path>) -> Result<()> {
    let mut app = App::new(config);
    if let Some(path) = file {
        app.open(path);
    }
    info!(output_dir = %config.output_dir.display(), "editor starting");

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &mut app, config);

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("editor closed");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    let event_handler = EventHandler::new(config.tick_rate);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match event_handler.next()? {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.on_key(key),
            Event::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

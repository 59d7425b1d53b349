// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, background results)
// - Rendering the UI

pub mod app;
pub mod components;
pub mod input;
pub mod layout;
pub mod markdown;
pub mod modal;
pub mod ui;

use crate::config::Config;
use crate::logging::LogBuffer;
use crate::startup::Services;
use crate::theme::Theme;
use anyhow::{Context, Result};
use app::{App, AppEvent};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// when done (also when the loop fails).
pub async fn run_tui(services: Services, log_buffer: LogBuffer, config: &Config) -> Result<()> {
    let theme = Theme::by_name(&config.theme, Config::themes_dir().as_deref());
    tracing::debug!("Using theme '{}'", theme.name);

    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut app = App::new(services, theme, log_buffer, event_tx);
    app.start();

    // Run the event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut event_rx).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on three sources with tokio::select!:
/// 1. Keyboard input
/// 2. Timer ticks (spinner animation, toast expiry redraws)
/// 3. Results of background manager calls
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));

    loop {
        app.refresh();
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard input
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        app.handle_key(key_event);
                    }
                }
            } => {}

            _ = tick_interval.tick() => {
                app.tick_animation();
            }

            Some(app_event) = event_rx.recv() => {
                app.handle_app_event(app_event);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

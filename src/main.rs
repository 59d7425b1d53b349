// LawPilot - terminal client for an AI legal assistant
//
// Authentication, AI answers and chat history live on a remote backend. This
// binary owns the client side:
// - Session store (session/): bearer token, signed-in user, authenticated requests
// - Chat session manager (chat/): conversations, transcript, agent mode, demo mode
// - Notification queue (notify/): toasts with auto-expiry
// - TUI (ratatui) and headless subcommands (clap) on top of the managers

mod api;
mod chat;
mod cli;
mod config;
mod logging;
mod model;
mod notify;
mod session;
mod startup;
mod theme;
mod tui;
mod util;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use logging::{LogBuffer, LogSink};
use startup::Services;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management runs without logging or a backend
    if let Some(Commands::Config { show, reset, path }) = cli.command {
        return cli::handle_config(show, reset, path);
    }

    // First run: write the commented template so there is something to edit
    if let Err(e) = Config::ensure_config_exists() {
        eprintln!("Warning: could not create config file: {:#}", e);
    }
    let mut config = Config::load()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    if let Some(dir) = Config::themes_dir() {
        // Bundled themes still work when the directory is read-only
        let _ = theme::ensure_themes_extracted(&dir);
    }

    match cli.command {
        None => {
            let log_buffer = LogBuffer::new();
            let _guard = logging::init(&config.logging, LogSink::Tui(log_buffer.clone()))?;

            let services = Services::start(&config)?;
            let result = tui::run_tui(services.clone(), log_buffer, &config).await;
            services.shutdown();
            result
        }
        Some(command) => {
            let _guard = logging::init(&config.logging, LogSink::Stderr)?;

            let services = Services::start(&config)?;
            let result = cli::run_command(command, &services).await;
            services.shutdown();
            result
        }
    }
}

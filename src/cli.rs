// CLI module - command-line argument parsing and handlers
//
// Without a subcommand the TUI starts. The subcommands cover the same
// operations headlessly:
// - ask: send one message and print the reply
// - login / register / logout / whoami: session management
// - conversations: list saved conversations
// - config --show / --path / --reset: configuration management

use crate::chat::SendOutcome;
use crate::config::{Config, VERSION};
use crate::model::AgentMode;
use crate::startup::Services;
use crate::theme::Theme;
use crate::util::{single_line, truncate_to_width};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

/// LawPilot - AI legal assistant for Indian law, in your terminal
#[derive(Parser, Debug)]
#[command(name = "lawpilot")]
#[command(version = VERSION)]
#[command(about = "Terminal client for the LawPilot legal assistant", long_about = None)]
pub struct Cli {
    /// Backend API base (overrides config and LAWPILOT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message and print the reply
    Ask {
        /// The question (several words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Agent mode: general, legal, compliance, risk
        #[arg(long)]
        agent: Option<AgentMode>,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Sign in (password is read from stdin)
    Login {
        #[arg(long)]
        email: String,
    },

    /// Create an account (password is read from stdin)
    Register {
        #[arg(long)]
        email: String,

        /// Full name shown in the client
        #[arg(long)]
        name: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// List saved conversations
    Conversations,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config subcommand (runs before logging and the managers exist)
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_config(show: bool, reset: bool, path: bool) -> Result<()> {
    if path {
        let path = Config::config_path().context("Could not determine config path")?;
        println!("{}", path.display());
    } else if show {
        handle_config_show()?;
    } else if reset {
        handle_config_reset()?;
    } else {
        println!("Usage: lawpilot config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::load()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    let themes = Theme::list_available(Config::themes_dir().as_deref());
    println!("# Available themes: {}", themes.join(", "));
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let path = Config::reset()?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session and chat subcommands
// ─────────────────────────────────────────────────────────────────────────────

/// Run a headless subcommand against the wired managers
pub async fn run_command(command: Commands, services: &Services) -> Result<()> {
    match command {
        Commands::Ask {
            text,
            agent,
            conversation,
        } => ask(services, &text.join(" "), agent, conversation).await,
        Commands::Login { email } => login(services, &email).await,
        Commands::Register { email, name } => register(services, &email, &name).await,
        Commands::Logout => {
            services.session.logout();
            println!("Signed out.");
            Ok(())
        }
        Commands::Whoami => whoami(services).await,
        Commands::Conversations => conversations(services).await,
        Commands::Config { show, reset, path } => handle_config(show, reset, path),
    }
}

async fn ask(
    services: &Services,
    text: &str,
    agent: Option<AgentMode>,
    conversation: Option<String>,
) -> Result<()> {
    let chat = &services.chat;
    services.session.check_persisted_session().await;

    if let Some(id) = conversation {
        if !chat.open_conversation(&id).await {
            bail!("Could not open conversation {}", id);
        }
    }
    // An explicit flag wins over the mode stored with the conversation
    if let Some(agent) = agent {
        chat.set_agent_mode(agent);
    }

    match chat.send_message(text).await {
        SendOutcome::Ignored => bail!("Nothing to send"),
        SendOutcome::Failed(e) => Err(e).context("Message not delivered"),
        outcome => {
            let state = chat.snapshot();
            if let Some(reply) = state.transcript.last() {
                println!("{}", reply.message.content);
            }
            if outcome == SendOutcome::Demo {
                eprintln!();
                eprintln!("(demo mode: sign in with `lawpilot login --email <you>` for real answers)");
            } else if let Some(current) = state.current {
                eprintln!();
                eprintln!("(conversation {})", current.id);
            }
            Ok(())
        }
    }
}

/// Read one line from stdin without echo handling; meant for pipes and prompts
fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

async fn login(services: &Services, email: &str) -> Result<()> {
    let password = read_password()?;
    let session = services.session.login(email, &password).await?;
    let name = session
        .user
        .as_ref()
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();
    println!("Welcome, {}!", name);
    Ok(())
}

async fn register(services: &Services, email: &str, name: &str) -> Result<()> {
    let password = read_password()?;
    services.session.register(email, &password, name).await?;
    println!("Account created. Welcome, {}!", name);
    Ok(())
}

async fn whoami(services: &Services) -> Result<()> {
    let session = &services.session;
    session.check_persisted_session().await;
    match session.snapshot().user {
        Some(user) => println!("{} <{}>", user.display_name(), user.email),
        None => println!("Not signed in."),
    }
    println!("Backend: {}", session.api_url());
    Ok(())
}

async fn conversations(services: &Services) -> Result<()> {
    services.session.check_persisted_session().await;
    if !services.session.is_authenticated() {
        bail!("Not signed in. Run `lawpilot login --email <you>` first");
    }
    if !services.chat.load_conversation_list().await {
        bail!("Could not load conversations");
    }

    let list = services.chat.snapshot().conversations;
    if list.is_empty() {
        println!("No conversations yet.");
    }
    for conv in list {
        let title = if conv.title.is_empty() {
            "(untitled)"
        } else {
            conv.title.as_str()
        };
        let last = conv
            .last_message
            .as_deref()
            .map(|m| truncate_to_width(&single_line(m), 60))
            .unwrap_or_default();
        println!(
            "{}\t{}\t{} messages\t{}",
            conv.id, title, conv.message_count, last
        );
    }
    Ok(())
}

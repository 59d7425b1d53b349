// Startup module - wires the managers together from the loaded config
//
// The TUI and the headless commands share this wiring: one HTTP transport,
// the file-backed token store, and the three managers built on top of them.

use crate::api::ReqwestTransport;
use crate::chat::{ChatOptions, ChatSession};
use crate::config::{Config, VERSION};
use crate::notify::NotificationQueue;
use crate::session::{FileTokenStore, SessionStore};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Everything the presentation layer talks to
#[derive(Clone)]
pub struct Services {
    pub session: SessionStore,
    pub chat: ChatSession,
    pub toasts: NotificationQueue,
}

impl Services {
    /// Build the managers. Must be called inside the Tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timings.request_timeout())
            .context("Failed to build HTTP client")?;
        let tokens = FileTokenStore::new(config.token_path.clone());

        let session = SessionStore::new(
            config.api_url.clone(),
            Arc::new(transport),
            Arc::new(tokens),
        );
        let chat = ChatSession::new(
            session.clone(),
            ChatOptions {
                demo_delay: config.timings.demo_delay(),
                initial_agent: config.default_agent,
            },
        );
        let toasts = NotificationQueue::new(config.timings.toast_ttl());

        log_startup(config);
        Ok(Self {
            session,
            chat,
            toasts,
        })
    }

    /// Abort scheduled work (demo replies, toast timers)
    pub fn shutdown(&self) {
        self.chat.shutdown();
        self.toasts.shutdown();
    }
}

fn log_startup(config: &Config) {
    tracing::info!("lawpilot v{} starting", VERSION);
    tracing::info!("Backend: {}", config.api_url);
    tracing::debug!(
        "Token file: {}, theme: {}, agent: {}",
        config.token_path.display(),
        config.theme,
        config.default_agent
    );
    match Config::config_path() {
        Some(path) if path.exists() => tracing::debug!("Config: {}", path.display()),
        _ => tracing::debug!("Config: defaults"),
    }
}

//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;
use crate::model::AgentMode;

/// Quote a value as a TOML basic string
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        let agents = AgentMode::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# lawpilot configuration
#
# Environment variables override this file:
#   LAWPILOT_API_URL, LAWPILOT_TOKEN_PATH, LAWPILOT_AGENT, LAWPILOT_THEME

# Backend API base
api_url = {api_url}

# Where the sign-in token is kept between runs
token_path = {token_path}

# Agent selected at startup: {agents}
default_agent = {agent}

# Theme: Courtroom Dark, Parchment Light, or a file in ~/.config/lawpilot/themes
theme = {theme}

[timings]
# How long notifications stay on screen
toast_ttl_ms = {toast_ttl}
# Simulated latency of demo replies when signed out
demo_delay_ms = {demo_delay}
request_timeout_secs = {timeout}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# JSON file logging (in addition to the TUI buffer or stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = {log_file_rotation}  # hourly, daily, never
file_prefix = {log_file_prefix}
"#,
            api_url = quoted(&self.api_url),
            token_path = quoted(&self.token_path.display().to_string()),
            agents = agents,
            agent = quoted(self.default_agent.as_str()),
            theme = quoted(&self.theme),
            toast_ttl = self.timings.toast_ttl_ms,
            demo_delay = self.timings.demo_delay_ms,
            timeout = self.timings.request_timeout_secs,
            log_level = quoted(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.display().to_string()),
            log_file_rotation = quoted(self.logging.file_rotation.as_str()),
            log_file_prefix = quoted(&self.logging.file_prefix),
        )
    }
}

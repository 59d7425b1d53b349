//! Configuration for the LawPilot client
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/lawpilot/config.toml)
//! 3. Built-in defaults (lowest priority)

use crate::model::AgentMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod serialization;


pub use logging::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend the client talks to unless told otherwise
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

pub const DEFAULT_THEME: &str = "Courtroom Dark";

// Environment overrides
const ENV_API_URL: &str = "LAWPILOT_API_URL";
const ENV_TOKEN_PATH: &str = "LAWPILOT_TOKEN_PATH";
const ENV_AGENT: &str = "LAWPILOT_AGENT";
const ENV_THEME: &str = "LAWPILOT_THEME";

/// `~/.config/lawpilot`
///
/// Uses Unix-style ~/.config on all platforms for consistency
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join("lawpilot"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Timings
// ─────────────────────────────────────────────────────────────────────────────

/// Delays and timeouts, all in the units the file uses
#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    /// How long a toast stays on screen
    pub toast_ttl_ms: u64,
    /// Simulated latency of demo replies
    pub demo_delay_ms: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            toast_ttl_ms: 4500,
            demo_delay_ms: 1200,
            request_timeout_secs: 30,
        }
    }
}

impl Timings {
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn from_file(file: Option<FileTimings>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        // A zero timeout would fail every request before it is sent
        let request_timeout_secs = match file.request_timeout_secs {
            Some(0) => anyhow::bail!("Invalid timings.request_timeout_secs: must be at least 1"),
            Some(secs) => secs,
            None => defaults.request_timeout_secs,
        };

        Ok(Self {
            toast_ttl_ms: file.toast_ttl_ms.unwrap_or(defaults.toast_ttl_ms),
            demo_delay_ms: file.demo_delay_ms.unwrap_or(defaults.demo_delay_ms),
            request_timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileTimings {
    pub toast_ttl_ms: Option<u64>,
    pub demo_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base, e.g. http://127.0.0.1:8000/api
    pub api_url: String,

    /// Where the bearer token is persisted between runs
    pub token_path: PathBuf,

    /// Agent mode selected when the client starts
    pub default_agent: AgentMode,

    /// Theme name, bundled or from ~/.config/lawpilot/themes
    pub theme: String,

    pub timings: Timings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let base = config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: base.join("token"),
            default_agent: AgentMode::General,
            theme: DEFAULT_THEME.to_string(),
            timings: Timings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure; every key is optional
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub token_path: Option<String>,
    pub default_agent: Option<String>,
    pub theme: Option<String>,

    /// Optional [timings] section
    pub timings: Option<FileTimings>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/lawpilot/config.toml
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|p| p.join("config.toml"))
    }

    /// Directory scanned for user themes
    pub fn themes_dir() -> Option<PathBuf> {
        config_dir().map(|p| p.join("themes"))
    }

    /// Create the config file with defaults if it doesn't exist yet.
    /// Returns the path when a file was written.
    pub fn ensure_config_exists() -> Result<Option<PathBuf>> {
        let Some(path) = Self::config_path() else {
            return Ok(None);
        };
        if path.exists() {
            return Ok(None);
        }
        Self::write_template(&path)?;
        Ok(Some(path))
    }

    /// Overwrite the config file with the default template
    pub fn reset() -> Result<PathBuf> {
        let path = Self::config_path().context("Cannot determine home directory")?;
        Self::write_template(&path)?;
        Ok(path)
    }

    fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        // Config::default().to_toml() is the single source of truth
        std::fs::write(path, Self::default().to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Read and parse a config file. A missing file yields defaults; a file
    /// that exists but does not parse is an error, never a silent fallback.
    pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).with_context(|| {
                format!(
                    "Failed to parse {} (check quoting, booleans and section names, \
                     or run `lawpilot config --reset`)",
                    path.display()
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn load() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) => Self::load_file_config(&path)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        // API URL: env > file > default
        let api_url = env(ENV_API_URL)
            .or(file.api_url)
            .unwrap_or(defaults.api_url);

        // Token path: env > file > default
        let token_path = env(ENV_TOKEN_PATH)
            .or(file.token_path)
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path);

        // Agent: env > file > default; a typo is an error, not a silent general
        let default_agent = match env(ENV_AGENT).or(file.default_agent) {
            Some(raw) => raw
                .parse::<AgentMode>()
                .map_err(anyhow::Error::msg)
                .context("Invalid default_agent")?,
            None => defaults.default_agent,
        };

        // Theme: env > file > default
        let theme = env(ENV_THEME).or(file.theme).unwrap_or(defaults.theme);

        let timings = Timings::from_file(file.timings)?;
        let logging = LoggingConfig::from_file(file.logging);

        Ok(Self {
            api_url,
            token_path,
            default_agent,
            theme,
            timings,
            logging,
        })
    }
}

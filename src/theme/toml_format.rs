// TOML theme format parser
//
// Each theme explicitly defines every colour the client uses: UI chrome,
// transcript roles and toast kinds. Only [code] is optional.
//
// Format version: 1

use ratatui::style::Color;
use serde::Deserialize;

/// Only format understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// Root structure for TOML theme files
#[derive(Debug, Clone, Deserialize)]
pub struct TomlTheme {
    pub meta: ThemeMeta,
    pub ui: UiColors,
    pub chat: ChatColors,
    pub toast: ToastColors,
    /// Optional markdown code colours
    pub code: Option<CodeColors>,
}

/// Theme metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeMeta {
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub author: Option<String>,
}

/// Base UI chrome colors
#[derive(Debug, Clone, Deserialize)]
pub struct UiColors {
    pub background: String,
    pub foreground: String,
    pub border: String,
    pub border_focused: String,
    pub title: String,
    pub status_bar: String,
    pub selection_bg: String,
    pub selection_fg: String,
    /// Optional muted/secondary text color (falls back to border)
    pub muted: Option<String>,
    /// Optional border style: "plain", "rounded", "double", "thick" (default: plain)
    pub border_type: Option<String>,
}

/// Transcript colours
#[derive(Debug, Clone, Deserialize)]
pub struct ChatColors {
    pub user: String,
    pub assistant: String,
    /// Agent badge next to assistant messages
    pub agent: String,
    /// Error notices and failed sends
    pub error: String,
    /// Messages still waiting for the backend
    pub pending: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToastColors {
    pub ok: String,
    pub error: String,
    pub warning: String,
    pub info: String,
}

/// Code/syntax highlighting colors (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct CodeColors {
    /// Color for `inline code` spans
    pub inline: String,
    /// Color for fenced code blocks
    pub block: String,
}

impl TomlTheme {
    /// Parse a TOML theme from string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve a theme color value
    ///
    /// `#RRGGBB` (leading `#` optional) or a terminal palette slot
    /// `ansi:0`..`ansi:15`. `ansi:fg` / `ansi:bg` keep the terminal default.
    /// Anything unreadable falls back to white.
    pub fn parse_color(value: &str) -> Color {
        const ANSI: [Color; 16] = [
            Color::Black,
            Color::Red,
            Color::Green,
            Color::Yellow,
            Color::Blue,
            Color::Magenta,
            Color::Cyan,
            Color::White,
            Color::DarkGray,
            Color::LightRed,
            Color::LightGreen,
            Color::LightYellow,
            Color::LightBlue,
            Color::LightMagenta,
            Color::LightCyan,
            Color::Gray,
        ];

        if let Some(slot) = value.strip_prefix("ansi:") {
            if matches!(slot, "fg" | "bg") {
                return Color::Reset;
            }
            return slot
                .parse::<usize>()
                .ok()
                .and_then(|i| ANSI.get(i).copied())
                .unwrap_or(Color::White);
        }

        let hex = value.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Color::White;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
            _ => Color::White,
        }
    }
}

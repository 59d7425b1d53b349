//! Bundled TOML themes (compiled into binary, extracted on first run)
//!
//! These themes are written to ~/.config/lawpilot/themes/ on first run.
//! Users can then modify them freely.

/// Bundled theme: file name and TOML content
pub struct BundledTheme {
    pub filename: &'static str,
    pub content: &'static str,
}

/// The flagship dark theme: walnut panelling and brass
pub const COURTROOM_DARK: &str = r##"# Courtroom Dark theme for lawpilot

[meta]
name = "Courtroom Dark"
version = 1
author = "lawpilot"

[ui]
background = "#1f2126"
foreground = "#d8d2c8"
border = "#3a3d45"
border_focused = "#c9a66b"
title = "#c9a66b"
status_bar = "#c9a66b"
selection_bg = "#3d3834"
selection_fg = "#ece7df"
muted = "#8a8279"
border_type = "rounded"

[chat]
user = "#7fa7c9"
assistant = "#d8d2c8"
agent = "#c9a66b"
error = "#d0675a"
pending = "#8a8279"

[toast]
ok = "#8fad5c"
error = "#d0675a"
warning = "#d4a54a"
info = "#7fa7c9"

[code]
inline = "#e8b87a"
block = "#9ca8b4"
"##;

pub const PARCHMENT_LIGHT: &str = r##"# Parchment Light theme for lawpilot

[meta]
name = "Parchment Light"
version = 1
author = "lawpilot"

[ui]
background = "#f6f1e7"
foreground = "#3b352c"
border = "#cfc4b0"
border_focused = "#8c5a2b"
title = "#8c5a2b"
status_bar = "#6b5a45"
selection_bg = "#e6dcc8"
selection_fg = "#2c271f"
muted = "#8f8474"
border_type = "plain"

[chat]
user = "#2f5f8a"
assistant = "#3b352c"
agent = "#8c5a2b"
error = "#a8382b"
pending = "#8f8474"

[toast]
ok = "#4f7a28"
error = "#a8382b"
warning = "#9a6a12"
info = "#2f5f8a"

[code]
inline = "#8c3f6b"
block = "#4f5b66"
"##;

/// Inherits the terminal's own palette
pub const TERMINAL_ANSI: &str = r##"# Terminal theme for lawpilot: uses your terminal's colours

[meta]
name = "Terminal"
version = 1
author = "lawpilot"

[ui]
background = "ansi:bg"
foreground = "ansi:fg"
border = "ansi:8"
border_focused = "ansi:3"
title = "ansi:3"
status_bar = "ansi:6"
selection_bg = "ansi:8"
selection_fg = "ansi:15"
muted = "ansi:8"

[chat]
user = "ansi:4"
assistant = "ansi:fg"
agent = "ansi:5"
error = "ansi:1"
pending = "ansi:8"

[toast]
ok = "ansi:2"
error = "ansi:1"
warning = "ansi:3"
info = "ansi:4"
"##;

/// All bundled themes
pub const BUNDLED_THEMES: &[BundledTheme] = &[
    BundledTheme {
        filename: "Courtroom_Dark.toml",
        content: COURTROOM_DARK,
    },
    BundledTheme {
        filename: "Parchment_Light.toml",
        content: PARCHMENT_LIGHT,
    },
    BundledTheme {
        filename: "Terminal.toml",
        content: TERMINAL_ANSI,
    },
];

/// Display names of the bundled themes ("Courtroom_Dark.toml" -> "Courtroom Dark")
pub fn list_bundled_themes() -> Vec<String> {
    BUNDLED_THEMES
        .iter()
        .map(|t| t.filename.trim_end_matches(".toml").replace('_', " "))
        .collect()
}

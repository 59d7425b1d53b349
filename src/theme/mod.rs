// Theme system for the TUI
//
// - TomlTheme: on-disk format with explicit colour definitions
// - Theme: resolved colours ready for rendering
//
// Theme loading priority:
// 1. User TOML themes from ~/.config/lawpilot/themes/*.toml
// 2. Bundled themes (compiled in, extracted on first run)
// 3. Fallback to hardcoded default

mod bundled;
mod toml_format;

pub use toml_format::TomlTheme;
use toml_format::FORMAT_VERSION;

use crate::model::Role;
use crate::notify::ToastKind;
use ratatui::style::Color;
use ratatui::widgets::BorderType;
use std::path::Path;

/// Complete resolved theme ready for use in the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // ─── UI Element Colors ───────────────────────────────────
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub highlight: Color, // Maps to border_focused
    pub title: Color,
    pub status_bar: Color,
    pub selection: Color,
    pub selection_fg: Color,
    pub muted: Color,
    pub border_type: BorderType,

    // ─── Transcript ──────────────────────────────────────────
    pub user_message: Color,
    pub assistant_message: Color,
    pub agent_badge: Color,
    pub error: Color,
    pub pending: Color,

    // ─── Toasts ──────────────────────────────────────────────
    pub toast_ok: Color,
    pub toast_error: Color,
    pub toast_warning: Color,
    pub toast_info: Color,

    // ─── Code Highlighting Colors ────────────────────────────
    pub code_inline: Color,
    pub code_block: Color,
}

impl Theme {
    /// Load a theme by display name, looking in `themes_dir` first
    pub fn by_name(name: &str, themes_dir: Option<&Path>) -> Self {
        if let Some(theme) = themes_dir.and_then(|dir| Self::load_user(name, dir)) {
            return theme;
        }
        if let Some(theme) = Self::load_bundled(name) {
            return theme;
        }
        tracing::warn!("Theme '{}' not found, using fallback", name);
        Self::hardcoded_default()
    }

    /// "Courtroom Dark" and "Courtroom_Dark" name the same file
    fn file_names(name: &str) -> [String; 2] {
        [format!("{}.toml", name), format!("{}.toml", name.replace(' ', "_"))]
    }

    fn load_user(name: &str, dir: &Path) -> Option<Self> {
        for filename in Self::file_names(name) {
            let path = dir.join(filename);
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            match TomlTheme::parse(&contents) {
                Ok(toml) if toml.meta.version != FORMAT_VERSION => tracing::warn!(
                    "Ignoring theme {}: format version {} (expected {})",
                    path.display(),
                    toml.meta.version,
                    FORMAT_VERSION
                ),
                Ok(toml) => {
                    tracing::debug!(
                        "Loaded theme '{}' by {} from {}",
                        toml.meta.name,
                        toml.meta.author.as_deref().unwrap_or("unknown"),
                        path.display()
                    );
                    return Some(Self::from_toml(toml));
                }
                Err(e) => tracing::warn!("Ignoring theme {}: {}", path.display(), e),
            }
        }
        None
    }

    fn load_bundled(name: &str) -> Option<Self> {
        let [_, filename] = Self::file_names(name);
        bundled::BUNDLED_THEMES
            .iter()
            .find(|t| t.filename.eq_ignore_ascii_case(&filename))
            .and_then(|t| TomlTheme::parse(t.content).ok())
            .map(Self::from_toml)
    }

    /// Parse border type string to BorderType enum
    fn parse_border_type(value: Option<&str>) -> BorderType {
        match value {
            Some("rounded") => BorderType::Rounded,
            Some("double") => BorderType::Double,
            Some("thick") => BorderType::Thick,
            _ => BorderType::Plain,
        }
    }

    /// Create theme from native TOML format
    fn from_toml(toml: TomlTheme) -> Self {
        let parse = TomlTheme::parse_color;
        let border = parse(&toml.ui.border);

        Self {
            name: toml.meta.name.clone(),

            background: parse(&toml.ui.background),
            foreground: parse(&toml.ui.foreground),
            border,
            highlight: parse(&toml.ui.border_focused),
            title: parse(&toml.ui.title),
            status_bar: parse(&toml.ui.status_bar),
            selection: parse(&toml.ui.selection_bg),
            selection_fg: parse(&toml.ui.selection_fg),
            muted: toml.ui.muted.as_deref().map(parse).unwrap_or(border),
            border_type: Self::parse_border_type(toml.ui.border_type.as_deref()),

            user_message: parse(&toml.chat.user),
            assistant_message: parse(&toml.chat.assistant),
            agent_badge: parse(&toml.chat.agent),
            error: parse(&toml.chat.error),
            pending: parse(&toml.chat.pending),

            toast_ok: parse(&toml.toast.ok),
            toast_error: parse(&toml.toast.error),
            toast_warning: parse(&toml.toast.warning),
            toast_info: parse(&toml.toast.info),

            // Code highlighting (explicit or fallback to chat colours)
            code_inline: toml
                .code
                .as_ref()
                .map(|c| parse(&c.inline))
                .unwrap_or_else(|| parse(&toml.chat.agent)),
            code_block: toml
                .code
                .as_ref()
                .map(|c| parse(&c.block))
                .unwrap_or_else(|| parse(&toml.chat.assistant)),
        }
    }

    /// Hardcoded fallback when no themes can be loaded
    fn hardcoded_default() -> Self {
        Self {
            name: "Fallback".to_string(),

            background: Color::Reset,
            foreground: Color::Reset,
            border: Color::DarkGray,
            highlight: Color::Yellow,
            title: Color::Yellow,
            status_bar: Color::Cyan,
            selection: Color::DarkGray,
            selection_fg: Color::White,
            muted: Color::DarkGray,
            border_type: BorderType::Plain,

            user_message: Color::Blue,
            assistant_message: Color::Reset,
            agent_badge: Color::Magenta,
            error: Color::Red,
            pending: Color::DarkGray,

            toast_ok: Color::Green,
            toast_error: Color::Red,
            toast_warning: Color::Yellow,
            toast_info: Color::Blue,

            code_inline: Color::Magenta,
            code_block: Color::Gray,
        }
    }

    pub fn role_color(&self, role: Role) -> Color {
        match role {
            Role::User => self.user_message,
            Role::Assistant => self.assistant_message,
        }
    }

    pub fn toast_color(&self, kind: ToastKind) -> Color {
        match kind {
            ToastKind::Ok => self.toast_ok,
            ToastKind::Error => self.toast_error,
            ToastKind::Warning => self.toast_warning,
            ToastKind::Info => self.toast_info,
        }
    }

    /// Border colour for a pane depending on focus
    pub fn pane_border(&self, focused: bool) -> Color {
        if focused {
            self.highlight
        } else {
            self.border
        }
    }

    /// List all available themes (bundled + user)
    pub fn list_available(themes_dir: Option<&Path>) -> Vec<String> {
        let mut themes = bundled::list_bundled_themes();

        let entries = themes_dir.and_then(|dir| std::fs::read_dir(dir).ok());
        for entry in entries.into_iter().flatten().flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                if let Some(stem) = path.file_stem() {
                    let display_name = stem.to_string_lossy().replace('_', " ");
                    if !themes.iter().any(|t| t.eq_ignore_ascii_case(&display_name)) {
                        themes.push(display_name);
                    }
                }
            }
        }

        themes
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load_bundled(crate::config::DEFAULT_THEME).unwrap_or_else(Self::hardcoded_default)
    }
}

/// Write bundled themes into `themes_dir` so users can copy and edit them.
/// Existing files are left alone.
pub fn ensure_themes_extracted(themes_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(themes_dir)?;

    for theme in bundled::BUNDLED_THEMES {
        let path = themes_dir.join(theme.filename);
        if !path.exists() {
            std::fs::write(&path, theme.content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_all_parse() {
        for theme in bundled::BUNDLED_THEMES {
            assert!(
                TomlTheme::parse(theme.content).is_ok(),
                "{} should parse",
                theme.filename
            );
        }
    }

    #[test]
    fn test_default_theme_is_bundled() {
        let theme = Theme::default();
        assert_eq!(theme.name, crate::config::DEFAULT_THEME);
        assert_eq!(theme.border_type, BorderType::Rounded);
    }

    #[test]
    fn test_by_name_accepts_spaces_or_underscores() {
        assert_eq!(Theme::by_name("Parchment Light", None).name, "Parchment Light");
        assert_eq!(Theme::by_name("parchment_light", None).name, "Parchment Light");
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        assert_eq!(Theme::by_name("Does Not Exist", None).name, "Fallback");
    }

    #[test]
    fn test_user_theme_overrides_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let custom = bundled::PARCHMENT_LIGHT
            .replace("name = \"Parchment Light\"", "name = \"My Chambers\"")
            .replace("#2f5f8a", "#112233");
        std::fs::write(dir.path().join("Parchment_Light.toml"), custom).unwrap();

        let theme = Theme::by_name("Parchment Light", Some(dir.path()));
        assert_eq!(theme.name, "My Chambers");
        assert_eq!(theme.user_message, Color::Rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_broken_user_theme_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Terminal.toml"), "[meta]\nname = 3\n").unwrap();
        assert_eq!(Theme::by_name("Terminal", Some(dir.path())).name, "Terminal");
    }

    #[test]
    fn test_user_theme_from_newer_format_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let future = bundled::PARCHMENT_LIGHT
            .replace("name = \"Parchment Light\"", "name = \"From The Future\"")
            .replace("version = 1", "version = 2");
        std::fs::write(dir.path().join("Parchment_Light.toml"), future).unwrap();

        let theme = Theme::by_name("Parchment Light", Some(dir.path()));
        assert_eq!(theme.name, "Parchment Light");
    }

    #[test]
    fn test_extract_then_list() {
        let dir = tempfile::tempdir().unwrap();
        ensure_themes_extracted(dir.path()).unwrap();
        std::fs::write(dir.path().join("Night_Court.toml"), bundled::COURTROOM_DARK).unwrap();

        let names = Theme::list_available(Some(dir.path()));
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"Courtroom Dark".to_string()));
        assert!(names.contains(&"Night Court".to_string()));
    }
}

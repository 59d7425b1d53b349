// Components module - reusable UI building blocks
//
// Shell components are rendered on every frame:
// - Title bar: brand, active agent, message count, account
// - Sidebar: agent picker and conversation list
// - Transcript: messages (or the welcome screen) with the typing indicator
// - Composer: the message input line
// - Status bar: key hints, latest warning, disclaimer
// - Toasts: stacked notifications in the bottom-right corner
//
// Each component is a focused, single-responsibility module.

pub mod composer;
pub mod sidebar;
pub mod status_bar;
pub mod title_bar;
pub mod toast;
pub mod transcript;

use crate::theme::Theme;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

/// Bordered pane whose border lights up when focused
pub fn pane<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.pane_border(focused)))
        .title_style(Style::default().fg(theme.pane_border(focused)))
}

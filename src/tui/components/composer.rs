// Composer component
//
// The message input line. Shows a placeholder naming the active agent and
// places the terminal cursor while the composer has focus.

use super::pane;
use crate::tui::app::{App, Focus};
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};

fn placeholder(app: &App) -> String {
    format!("Ask {} anything…", app.chat.agent.label().to_lowercase())
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.focus == Focus::Input && app.modal.is_none();
    let title = if app.chat.sending {
        format!(" {} waiting for reply ", app.spinner_char())
    } else {
        " Message ".to_string()
    };
    let block = pane(&title, focused, theme);

    let width = area.width.saturating_sub(3) as usize;
    let (shown, cursor) = app.input.visible(width);

    let content = if app.input.text().is_empty() {
        Span::styled(
            placeholder(app),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(shown, Style::default().fg(theme.foreground))
    };
    f.render_widget(Paragraph::new(content).block(block), area);

    if focused && !app.loading {
        f.set_cursor_position(Position::new(area.x + 1 + cursor, area.y + 1));
    }
}

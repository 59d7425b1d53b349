// Status bar component
//
// Key hints for the focused pane on the left. On the right, the most recent
// warning from the log (for a while after it happened) or the disclaimer.

use crate::logging::LogEntry;
use crate::tui::app::{App, Focus};
use crate::tui::layout::Breakpoint;
use crate::util::{single_line, truncate_to_width};
use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const DISCLAIMER: &str = "LawPilot AI · Not a substitute for professional legal advice";

/// How long a logged problem stays in the status bar
const PROBLEM_SECS: i64 = 30;

fn hints(focus: Focus, wide: bool) -> &'static str {
    match (focus, wide) {
        (Focus::Input, true) => " Enter send · Tab focus · ^N new chat · ^L account · F1 help · ^Q quit",
        (Focus::Input, false) => " Enter send · Tab · ^N · ^L · F1",
        (Focus::History, true) => " ↑↓ select · Enter open · 1-4 agent · Tab focus · ^N new chat",
        (Focus::History, false) => " ↑↓ · Enter open · Tab",
        (Focus::Agents, true) => " ←→ or 1-4 pick agent · Enter back to message · Tab focus",
        (Focus::Agents, false) => " ←→ agent · Tab",
    }
}

fn problem_text(entry: &LogEntry) -> String {
    format!("⚠ {} {}", entry.level.as_str(), single_line(&entry.message))
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let wide = Breakpoint::from_width(area.width).at_least(Breakpoint::Wide);
    let left = hints(app.focus, wide);

    let recent_problem = app
        .log_buffer
        .latest_problem()
        .filter(|e| (Utc::now() - e.timestamp).num_seconds() < PROBLEM_SECS);

    let room = (area.width as usize).saturating_sub(left.width() + 2);
    let right = match &recent_problem {
        Some(entry) => Span::styled(
            truncate_to_width(&problem_text(entry), room),
            Style::default().fg(theme.error),
        ),
        None => Span::styled(
            truncate_to_width(DISCLAIMER, room),
            Style::default().fg(theme.muted),
        ),
    };

    let gap = room.saturating_sub(right.content.width()) + 1;
    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(theme.status_bar)),
        Span::raw(" ".repeat(gap)),
        right,
    ]);

    let status = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_problem_text_names_level_on_one_line() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "Failed to load conversations:\nNot Found".to_string(),
        };
        let text = problem_text(&entry);
        assert!(text.starts_with("⚠ WARN Failed to load conversations:"));
        assert!(!text.contains('\n'));
    }
}

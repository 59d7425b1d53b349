// Sidebar component
//
// Agent picker on top, saved conversations below, account row at the bottom.

use super::pane;
use crate::model::{AgentMode, ConversationSummary};
use crate::tui::app::{App, Focus};
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let [agents, history, account] = Layout::vertical([
        Constraint::Length(AgentMode::ALL.len() as u16 + 2),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(area);

    render_agents(f, agents, app);
    render_history(f, history, app);
    render_account(f, account, app);
}

fn render_agents(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let lines: Vec<Line> = AgentMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let active = *mode == app.chat.agent;
            let marker = if active { "●" } else { "○" };
            let style = if active {
                Style::default()
                    .fg(theme.agent_badge)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.foreground)
            };
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(theme.muted)),
                Span::styled(format!("{} {}", marker, mode.short_label()), style),
            ])
        })
        .collect();

    let block = pane(" Agent Mode ", app.focus == Focus::Agents, theme);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// One list row: title (or placeholder) and message count
fn history_row(conv: &ConversationSummary, width: usize, current: bool) -> String {
    let title = if conv.title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        single_line(&conv.title)
    };
    let marker = if current { "▸ " } else { "  " };
    let count = format!(" {}", conv.message_count);
    let room = width.saturating_sub(marker.width() + count.width());
    format!("{}{}{}", marker, truncate_to_width(&title, room), count)
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.focus == Focus::History;
    let block = pane(" Conversations ", focused, theme);

    if app.chat.conversations.is_empty() {
        let hint = if app.is_authenticated() {
            " No conversations yet"
        } else {
            " Sign in to save conversations"
        };
        let text = Paragraph::new(Span::styled(hint, Style::default().fg(theme.muted)))
            .block(block);
        f.render_widget(text, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let current_id = app.chat.current.as_ref().map(|c| c.id.as_str());
    let items: Vec<ListItem> = app
        .chat
        .conversations
        .iter()
        .map(|conv| {
            let current = current_id == Some(conv.id.as_str());
            let style = if current {
                Style::default().fg(theme.highlight)
            } else {
                Style::default().fg(theme.foreground)
            };
            ListItem::new(Span::styled(history_row(conv, width, current), style))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(theme.selection)
            .fg(theme.selection_fg)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.history_selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_account(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let line = match &app.user {
        Some(user) => Line::from(vec![
            Span::styled(
                format!(" {}", user.display_name()),
                Style::default().fg(theme.foreground),
            ),
            Span::styled("  ^L sign out", Style::default().fg(theme.muted)),
        ]),
        None => Line::from(vec![
            Span::styled(" Demo mode", Style::default().fg(theme.pending)),
            Span::styled("  ^L sign in", Style::default().fg(theme.muted)),
        ]),
    };
    f.render_widget(Paragraph::new(line).block(pane("", false, theme)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str, count: u32) -> ConversationSummary {
        ConversationSummary {
            id: "c1".into(),
            title: title.into(),
            message_count: count,
            last_message: None,
        }
    }

    #[test]
    fn test_history_row_fits_width() {
        let row = history_row(&summary("Enforceability of NDAs in India", 12), 20, true);
        assert!(row.starts_with("▸ "));
        assert!(row.ends_with(" 12"));
        assert!(row.contains('…'));
    }

    #[test]
    fn test_untitled_placeholder() {
        assert_eq!(history_row(&summary("  ", 0), 30, false), "  Untitled 0");
    }
}

// Title bar component
//
// Renders the brand, the active agent with the message count, and who is
// signed in (or that the client is in demo mode).

use crate::tui::app::App;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// "3 msgs" once a conversation has content, "Ready" before
fn message_badge(count: usize) -> String {
    if count == 0 {
        "Ready".to_string()
    } else {
        format!("{} msgs", count)
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let mut spans = vec![
        Span::styled(
            " ⚖ LawPilot",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ──── ", Style::default().fg(theme.border)),
        Span::styled(
            app.chat.agent.label(),
            Style::default().fg(theme.agent_badge),
        ),
        Span::styled(
            format!(" · {}", message_badge(app.chat.transcript.len())),
            Style::default().fg(theme.muted),
        ),
    ];

    if let Some(title) = app.chat.current.as_ref().and_then(|c| c.title.as_deref()) {
        let room = (area.width as usize).saturating_sub(60).max(10);
        spans.push(Span::styled(
            format!(" · {}", truncate_to_width(title, room)),
            Style::default().fg(theme.foreground),
        ));
    }

    let account = match &app.user {
        Some(user) => format!(" {} ", user.display_name()),
        None => " Demo mode ".to_string(),
    };

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.title))
            .title_top(Line::from(account).right_aligned()),
    );

    f.render_widget(title, area);
}

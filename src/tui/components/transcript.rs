// Transcript component
//
// Renders the active conversation, or the welcome screen when it is empty.
// Lines are laid out here (wrapped to the pane width) so scrolling can be
// computed in whole lines.

use super::pane;
use crate::chat::{ChatState, Delivery, TranscriptEntry};
use crate::model::Role;
use crate::theme::Theme;
use crate::tui::app::App;
use crate::tui::markdown::{render_markdown, render_plain};
use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

/// Message bodies are indented under their header
const INDENT: &str = "  ";

const FEATURES: [(&str, &str); 4] = [
    (
        "Legal Analysis",
        "Indian Contract Act, Companies Act, IP laws with section citations",
    ),
    (
        "Compliance",
        "GST, IT Act, DPDP, RBI, SEBI checks with deadlines",
    ),
    ("Risk Scoring", "AI-powered risk assessment with 0-100 scoring"),
    ("Doc Review", "Analyze contracts, NDAs, and policy documents"),
];

const TOPICS: [&str; 12] = [
    "Companies Act 2013",
    "GST Compliance",
    "DPDP Act",
    "Contract Law",
    "SEBI Regulations",
    "IP Protection",
    "FEMA Rules",
    "IT Act 2000",
    "Risk Assessment",
    "NDA Review",
    "Employment Law",
    "RBI Guidelines",
];

fn is_error_notice(entry: &TranscriptEntry) -> bool {
    entry.delivery == Delivery::LocalOnly
        && entry.message.role == Role::Assistant
        && entry.message.content.starts_with("**Error:**")
}

fn header(entry: &TranscriptEntry, theme: &Theme) -> Line<'static> {
    let message = &entry.message;
    let (name, color) = match message.role {
        Role::User => ("You", theme.user_message),
        Role::Assistant => (message.agent_mode.label(), theme.agent_badge),
    };
    let time = message.created_at.with_timezone(&Local).format("%H:%M");

    let mut spans = vec![
        Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" · {}", time), Style::default().fg(theme.muted)),
    ];
    match entry.delivery {
        Delivery::Pending => {
            spans.push(Span::styled(" · sending", Style::default().fg(theme.pending)));
        }
        Delivery::Failed => {
            spans.push(Span::styled(" · not sent", Style::default().fg(theme.error)));
        }
        Delivery::Confirmed | Delivery::LocalOnly => {}
    }
    Line::from(spans)
}

/// Lay out the whole transcript for a pane `width` columns wide
pub fn transcript_lines(
    state: &ChatState,
    width: usize,
    theme: &Theme,
    spinner: char,
) -> Vec<Line<'static>> {
    let body_width = width.saturating_sub(INDENT.len()).max(1);
    let mut lines = Vec::new();

    for entry in state.transcript.entries() {
        lines.push(header(entry, theme));

        let mut body = match entry.message.role {
            Role::User => render_plain(
                &entry.message.content,
                body_width,
                Style::default().fg(theme.role_color(Role::User)),
            ),
            Role::Assistant => {
                let base = Style::default().fg(theme.role_color(Role::Assistant));
                render_markdown(&entry.message.content, body_width, theme)
                    .into_iter()
                    .map(|line| line.style(base))
                    .collect()
            }
        };
        if is_error_notice(entry) {
            let error = Style::default().fg(theme.error);
            for line in &mut body {
                for span in &mut line.spans {
                    span.style = span.style.patch(error);
                }
            }
        }

        for mut line in body {
            line.spans.insert(0, Span::raw(INDENT));
            lines.push(line);
        }
        lines.push(Line::default());
    }

    if state.sending {
        lines.push(Line::from(vec![
            Span::styled(
                state.agent.label(),
                Style::default()
                    .fg(theme.agent_badge)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} thinking…", spinner),
                Style::default().fg(theme.pending),
            ),
        ]));
    }

    lines
}

fn welcome_lines(theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "⚖",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                "Law",
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "Pilot",
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " AI",
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "AI-powered legal intelligence for Indian businesses.",
            Style::default().fg(theme.muted),
        )),
        Line::from(Span::styled(
            "Ask about laws, check compliance, or assess risks.",
            Style::default().fg(theme.muted),
        )),
        Line::default(),
    ];

    for (title, desc) in FEATURES {
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme.agent_badge)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            desc,
            Style::default().fg(theme.foreground),
        )));
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled(
        TOPICS.join(" ● "),
        Style::default().fg(theme.muted),
    )));
    lines
}

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = &app.theme;

    if app.chat.transcript.is_empty() && !app.chat.sending {
        let welcome = Paragraph::new(welcome_lines(theme))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(pane("", false, theme));
        f.render_widget(welcome, area);
        app.transcript_max_scroll = 0;
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let lines = transcript_lines(&app.chat, inner_width, theme, app.spinner_char());

    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll = app.transcript_scroll.min(max_scroll);
    let offset = (max_scroll - scroll).min(u16::MAX as usize) as u16;

    let title = if scroll > 0 {
        format!(" ↑ {} more ", scroll)
    } else {
        String::new()
    };
    let block = pane(&title, false, theme);
    f.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);

    app.transcript_max_scroll = max_scroll;
    app.transcript_scroll = scroll;
}

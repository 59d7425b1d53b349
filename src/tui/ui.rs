// Frame layout and overlays
//
// ┌ title ──────────────────────────────────────────┐
// ├ sidebar ─┬ transcript ───────────────────────────┤
// │ agents   │                                       │
// │ history  ├ composer ─────────────────────────────┤
// │ account  │                                       │
// └──────────┴───────────────────────────────────────┘
//   status
//
// Toasts and the open modal draw on top. Narrow terminals show either the
// sidebar or the chat, depending on focus.

use super::app::{App, Focus};
use super::components::{composer, sidebar, status_bar, title_bar, toast, transcript};
use super::layout::Breakpoint;
use super::modal::{AuthField, AuthForm, AuthMode, Modal};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if app.loading {
        render_loading(f, area, app);
        return;
    }

    let [title, body, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(2),
    ])
    .areas(area);

    title_bar::render(f, title, app);

    let bp = Breakpoint::from_width(area.width);
    let sidebar_focused = matches!(app.focus, Focus::History | Focus::Agents);
    let chat_area = match bp.sidebar_width() {
        Some(width) => {
            let [side, chat] =
                Layout::horizontal([Constraint::Length(width), Constraint::Min(20)]).areas(body);
            sidebar::render(f, side, app);
            Some(chat)
        }
        None if sidebar_focused => {
            sidebar::render(f, body, app);
            None
        }
        None => Some(body),
    };

    if let Some(chat) = chat_area {
        let [messages, input] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(chat);
        transcript::render(f, messages, app);
        composer::render(f, input, app);
    }

    status_bar::render(f, status, app);

    let toasts = app.services.toasts.toasts();
    toast::render(f, body, &toasts, &app.theme);

    if let Some(modal) = &app.modal {
        match modal {
            Modal::Help => render_help(f, area, app),
            Modal::Auth(form) => render_auth(f, area, form, app),
        }
    }
}

/// Calculate centered rect for modal dialog
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn modal_block<'a>(title: &'a str, app: &App) -> Block<'a> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight))
        .style(Style::default().bg(app.theme.background))
}

fn render_loading(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = Text::from(vec![
        Line::from(Span::styled(
            "⚖",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Initializing LawPilot AI",
            Style::default().fg(theme.foreground),
        )),
        Line::from(Span::styled(
            app.spinner_char().to_string(),
            Style::default().fg(theme.highlight),
        )),
    ]);
    let rect = centered_rect(40, 4, area);
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), rect);
}

fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let key_style = Style::default().fg(theme.agent_badge);
    let desc_style = Style::default().fg(theme.foreground);
    let header_style = Style::default()
        .fg(theme.highlight)
        .add_modifier(Modifier::BOLD);

    let kb = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{:<12}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let content = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled("  Chat", header_style)),
        kb("Enter", "Send message"),
        kb("PgUp/PgDn", "Scroll transcript"),
        kb("Ctrl+N", "New conversation"),
        kb("Ctrl+W/U", "Delete word / line"),
        Line::raw(""),
        Line::from(Span::styled("  Navigation", header_style)),
        kb("Tab", "Cycle message / history / agents"),
        kb("↑/↓ Enter", "Open a conversation"),
        kb("←/→, 1-4", "Pick agent mode"),
        Line::raw(""),
        Line::from(Span::styled("  Account", header_style)),
        kb("Ctrl+L", "Sign in / sign out"),
        kb("Ctrl+R", "Switch sign in / create account"),
        Line::raw(""),
        Line::from(Span::styled("  General", header_style)),
        kb("Esc", "Close dialog / dismiss toast"),
        kb("Ctrl+Q", "Quit"),
    ]);

    let rect = centered_rect(52, content.lines.len() as u16 + 3, area);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(content).block(modal_block(" Keys ", app)),
        rect,
    );
}

fn field_label(field: AuthField) -> &'static str {
    match field {
        AuthField::Name => " Full name ",
        AuthField::Email => " Email ",
        AuthField::Password => " Password ",
    }
}

fn render_auth(f: &mut Frame, area: Rect, form: &AuthForm, app: &App) {
    let theme = &app.theme;
    let fields = AuthForm::fields(form.mode);
    let (title, switch_hint) = match form.mode {
        AuthMode::Login => (" Sign in ", "^R create account"),
        AuthMode::Register => (" Create account ", "^R sign in instead"),
    };

    let height = fields.len() as u16 * 3 + 5;
    let rect = centered_rect(54, height, area);
    f.render_widget(Clear, rect);
    let block = modal_block(title, app);
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(1));
    let rows = Layout::vertical(constraints).split(inner);

    for (i, field) in fields.iter().enumerate() {
        let focused = form.focus == *field;
        let row = rows[i];
        let input = form.field(*field);
        let (shown, cursor) = input.visible(row.width.saturating_sub(3) as usize);

        let block = Block::default()
            .title(field_label(*field))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.pane_border(focused)));
        f.render_widget(
            Paragraph::new(Span::styled(shown, Style::default().fg(theme.foreground)))
                .block(block),
            row,
        );
        if focused && !form.submitting {
            f.set_cursor_position(Position::new(row.x + 1 + cursor, row.y + 1));
        }
    }

    let status = match (&form.error, form.submitting) {
        (_, true) => Span::styled(
            format!(" {} Please wait…", app.spinner_char()),
            Style::default().fg(theme.pending),
        ),
        (Some(error), false) => Span::styled(format!(" {}", error), Style::default().fg(theme.error)),
        (None, false) => Span::raw(""),
    };
    f.render_widget(Paragraph::new(status), rows[fields.len()]);

    let hints = Span::styled(
        format!(" Enter submit · Tab next · {} · Esc cancel", switch_hint),
        Style::default().fg(theme.muted),
    );
    f.render_widget(Paragraph::new(hints), rows[fields.len() + 1]);
}

//! Toast notification component
//!
//! Non-blocking overlays stacked in the bottom-right corner, oldest on top.
//! The queue owns expiry; this only draws what is currently in it.

use crate::notify::Toast;
use crate::theme::Theme;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const MAX_WIDTH: u16 = 44;

/// Rows a toast needs: borders, title, optional message
fn toast_height(toast: &Toast) -> u16 {
    if toast.message.is_some() {
        4
    } else {
        3
    }
}

/// Stack positions bottom-up, newest lowest; toasts that do not fit are skipped
fn stack(toasts: &[Toast], area: Rect) -> Vec<(usize, Rect)> {
    let width = MAX_WIDTH.min(area.width.saturating_sub(2));
    let x = area.right().saturating_sub(width + 1);
    let mut bottom = area.bottom().saturating_sub(1);
    let mut placed = Vec::new();

    for (i, toast) in toasts.iter().enumerate().rev() {
        let height = toast_height(toast);
        if bottom < area.y + height {
            break;
        }
        bottom -= height;
        placed.push((i, Rect::new(x, bottom, width, height)));
    }
    placed
}

/// Render every toast over `area`
pub fn render(f: &mut Frame, area: Rect, toasts: &[Toast], theme: &Theme) {
    for (i, rect) in stack(toasts, area) {
        let toast = &toasts[i];
        let color = theme.toast_color(toast.kind);
        let inner = rect.width.saturating_sub(4) as usize;

        let mut lines = vec![Line::from(Span::styled(
            truncate_to_width(&format!("{} {}", toast.kind.icon(), toast.title), inner),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))];
        if let Some(message) = &toast.message {
            lines.push(Line::from(Span::styled(
                truncate_to_width(message, inner),
                Style::default().fg(theme.foreground),
            )));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme.background));

        // Clear the area first so toast appears on top
        f.render_widget(Clear, rect);
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

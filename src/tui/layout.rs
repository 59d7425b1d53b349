/// Responsive breakpoint system for TUI layout decisions.
///
/// Single source of truth for width thresholds - no magic numbers scattered in render code.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    /// < 70 cols: sidebar and chat share the screen in turns
    Compact,
    /// 70-119 cols: narrow sidebar
    Normal,
    /// 120+ cols: roomy sidebar, full status hints
    Wide,
}

impl Breakpoint {
    pub fn from_width(width: u16) -> Self {
        match width {
            0..=69 => Breakpoint::Compact,
            70..=119 => Breakpoint::Normal,
            _ => Breakpoint::Wide,
        }
    }

    /// Check if at least this breakpoint (inclusive)
    pub fn at_least(&self, min: Breakpoint) -> bool {
        *self >= min
    }

    /// Sidebar columns; None when it does not fit beside the chat
    pub fn sidebar_width(&self) -> Option<u16> {
        match self {
            Breakpoint::Compact => None,
            Breakpoint::Normal => Some(26),
            Breakpoint::Wide => Some(34),
        }
    }
}

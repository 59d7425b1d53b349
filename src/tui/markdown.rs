// Markdown rendering for the transcript
//
// Assistant replies arrive as markdown (bold labels, numbered steps, quoted
// disclaimers, the occasional table of sections). pulldown-cmark parses them
// into segments, which are then laid out into wrapped, styled ratatui Lines.

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Inline emphasis active on a run of text; flags nest freely
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
}

impl Emphasis {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strike {
            style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
        }
        style
    }
}

/// A piece of parsed markdown
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text { text: String, emphasis: Emphasis },
    InlineCode(String),
    CodeBlock(String),
    SoftBreak,
    HardBreak,
    ParagraphEnd,
    Heading { level: u8, text: String },
    ListItemStart { ordered: bool, number: u64, depth: usize },
    ListItemEnd,
    QuoteStart,
    QuoteEnd,
    Rule,
    Link { text: String, url: String },
    TableRow { cells: Vec<String>, header: bool },
    TableEnd,
}

#[derive(Default)]
struct TableState {
    row: Vec<String>,
    cell: String,
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Parse markdown into segments
pub fn parse_markdown(markdown: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut emphasis = Emphasis::default();
    let mut heading: Option<(u8, String)> = None;
    let mut code_block: Option<String> = None;
    // (url, text)
    let mut link: Option<(String, String)> = None;
    // One entry per open list: next number for ordered lists
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut table: Option<TableState> = None;

    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Text(text) => {
                if let Some(code) = code_block.as_mut() {
                    code.push_str(&text);
                } else if let Some((_, content)) = heading.as_mut() {
                    content.push_str(&text);
                } else if let Some(table) = table.as_mut() {
                    table.cell.push_str(&text);
                } else if let Some((_, content)) = link.as_mut() {
                    content.push_str(&text);
                } else {
                    segments.push(Segment::Text {
                        text: text.to_string(),
                        emphasis,
                    });
                }
            }

            Event::Code(code) => {
                if let Some((_, content)) = heading.as_mut() {
                    content.push_str(&code);
                } else if let Some(table) = table.as_mut() {
                    table.cell.push_str(&code);
                } else if let Some((_, content)) = link.as_mut() {
                    content.push_str(&code);
                } else {
                    segments.push(Segment::InlineCode(code.to_string()));
                }
            }

            // Raw HTML is shown as written
            Event::Html(html) | Event::InlineHtml(html) => {
                segments.push(Segment::Text {
                    text: html.to_string(),
                    emphasis,
                });
            }

            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((heading_level(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = heading.take() {
                    segments.push(Segment::Heading { level, text });
                }
            }

            Event::Start(Tag::CodeBlock(_)) => code_block = Some(String::new()),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = code_block.take() {
                    segments.push(Segment::CodeBlock(code.trim_end_matches('\n').to_string()));
                }
            }

            Event::End(TagEnd::Paragraph) => segments.push(Segment::ParagraphEnd),

            Event::SoftBreak => match heading.as_mut() {
                Some((_, content)) => content.push(' '),
                None => segments.push(Segment::SoftBreak),
            },
            Event::HardBreak => segments.push(Segment::HardBreak),

            Event::Start(Tag::List(first)) => lists.push(first),
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    segments.push(Segment::ParagraphEnd);
                }
            }

            Event::Start(Tag::Item) => {
                let depth = lists.len();
                if let Some(slot) = lists.last_mut() {
                    let number = slot.unwrap_or(0);
                    if let Some(next) = slot.as_mut() {
                        *next += 1;
                    }
                    segments.push(Segment::ListItemStart {
                        ordered: slot.is_some(),
                        number,
                        depth,
                    });
                }
            }
            Event::End(TagEnd::Item) => segments.push(Segment::ListItemEnd),

            Event::Start(Tag::Strong) => emphasis.bold = true,
            Event::End(TagEnd::Strong) => emphasis.bold = false,
            Event::Start(Tag::Emphasis) => emphasis.italic = true,
            Event::End(TagEnd::Emphasis) => emphasis.italic = false,
            Event::Start(Tag::Strikethrough) => emphasis.strike = true,
            Event::End(TagEnd::Strikethrough) => emphasis.strike = false,

            Event::Start(Tag::BlockQuote) => segments.push(Segment::QuoteStart),
            Event::End(TagEnd::BlockQuote) => segments.push(Segment::QuoteEnd),

            Event::Rule => segments.push(Segment::Rule),

            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some((dest_url.to_string(), String::new()));
            }
            Event::End(TagEnd::Link) => {
                if let Some((url, text)) = link.take() {
                    segments.push(Segment::Link { text, url });
                }
            }

            Event::Start(Tag::Table(_)) => table = Some(TableState::default()),
            Event::End(TagEnd::Table) => {
                table = None;
                segments.push(Segment::TableEnd);
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(table) = table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            // The head holds its cells directly, without a row
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                let header = matches!(event, Event::End(TagEnd::TableHead));
                if let Some(table) = table.as_mut() {
                    segments.push(Segment::TableRow {
                        cells: std::mem::take(&mut table.row),
                        header,
                    });
                }
            }

            _ => {}
        }
    }

    segments
}

/// Wrap text to fit within width, breaking at word boundaries
/// Preserves leading/trailing whitespace to maintain spacing between segments
///
/// Uses unicode display width for correct handling of emojis, CJK, etc.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let leading_space = text.starts_with(char::is_whitespace);
    let trailing_space = text.ends_with(char::is_whitespace);

    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    if leading_space {
        current.push(' ');
        current_width = 1;
    }

    for word in text.split_whitespace() {
        let word_width = word.width();
        let at_start = current.trim().is_empty();
        if at_start {
            current.push_str(word);
            current_width += word_width;
        } else if current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            result.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }

    if trailing_space && !current.trim().is_empty() {
        current.push(' ');
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Accumulates spans into lines, adding blockquote bars at line starts
struct LineBuilder<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    used: usize,
    quote_depth: usize,
}

impl<'t> LineBuilder<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            used: 0,
            quote_depth: 0,
        }
    }

    fn start_line(&mut self) {
        if self.spans.is_empty() && self.quote_depth > 0 {
            let bars = "│ ".repeat(self.quote_depth);
            self.used = bars.width();
            self.spans
                .push(Span::styled(bars, Style::default().fg(self.theme.muted)));
        }
    }

    fn push(&mut self, text: String, style: Style) {
        self.start_line();
        self.used += text.width();
        self.spans.push(Span::styled(text, style));
    }

    /// Push text, wrapping onto new lines when it would overflow
    fn push_wrapped(&mut self, text: &str, style: Style) {
        // Quote bars take two columns per level
        let wrap_width = self.width.saturating_sub(self.quote_depth * 2).max(1);
        let parts: Vec<&str> = text.split('\n').collect();
        for (i, part) in parts.iter().enumerate() {
            for (j, piece) in wrap_text(part, wrap_width).into_iter().enumerate() {
                let overflow = self.used > 0 && self.used + piece.width() > self.width;
                if j > 0 || overflow {
                    self.flush();
                }
                // A wrapped continuation never starts with a space
                let piece = if self.spans.is_empty() {
                    piece.trim_start().to_string()
                } else {
                    piece
                };
                if !piece.is_empty() {
                    self.push(piece, style);
                }
            }
            if i + 1 < parts.len() {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
        self.used = 0;
    }

    /// Paragraph spacing; never doubles up and never leads
    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Lay segments out into lines no wider than `width` (code blocks excepted)
pub fn segments_to_lines(segments: &[Segment], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut out = LineBuilder::new(theme, width);

    for segment in segments {
        match segment {
            Segment::Text { text, emphasis } => out.push_wrapped(text, emphasis.style()),

            Segment::InlineCode(code) => {
                out.push(code.clone(), Style::default().fg(theme.code_inline));
            }

            Segment::CodeBlock(code) => {
                out.flush();
                for line in code.lines() {
                    out.push(
                        format!("  {}", line),
                        Style::default()
                            .fg(theme.code_block)
                            .add_modifier(Modifier::DIM),
                    );
                    out.flush();
                }
                out.blank();
            }

            Segment::SoftBreak => {
                if !out.spans.is_empty() {
                    out.push(" ".to_string(), Style::default());
                }
            }
            Segment::HardBreak => out.flush(),
            Segment::ParagraphEnd => out.blank(),

            Segment::Heading { level, text } => {
                out.blank();
                let style = match level {
                    1 => Style::default()
                        .fg(theme.title)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    2 => Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
                    _ => Style::default().add_modifier(Modifier::BOLD),
                };
                out.push_wrapped(text, style);
                out.flush();
            }

            Segment::ListItemStart {
                ordered,
                number,
                depth,
            } => {
                out.flush();
                let indent = "  ".repeat(depth.saturating_sub(1));
                let marker = if *ordered {
                    format!("{}{}. ", indent, number)
                } else {
                    format!("{}• ", indent)
                };
                out.push(marker, Style::default().fg(theme.muted));
            }
            Segment::ListItemEnd => out.flush(),

            Segment::QuoteStart => {
                out.flush();
                out.quote_depth += 1;
            }
            Segment::QuoteEnd => {
                out.flush();
                out.quote_depth = out.quote_depth.saturating_sub(1);
                out.blank();
            }

            Segment::Rule => {
                out.flush();
                let rule = "─".repeat(width.saturating_sub(4).max(10));
                out.push(rule, Style::default().fg(theme.border));
                out.flush();
            }

            Segment::Link { text, url } => {
                let display = if text.is_empty() || text == url {
                    url.clone()
                } else {
                    format!("{} ({})", text, url)
                };
                out.push(
                    display,
                    Style::default()
                        .fg(theme.highlight)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }

            Segment::TableRow { cells, header } => {
                out.flush();
                let row = cells.join(" │ ");
                let row_width = row.width();
                let style = if *header {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                out.push(row, style);
                out.flush();
                if *header {
                    out.push(
                        "─".repeat(row_width.min(width.max(1))),
                        Style::default().fg(theme.border),
                    );
                    out.flush();
                }
            }
            Segment::TableEnd => out.blank(),
        }
    }

    out.finish()
}

/// Strip control characters that can cause TUI rendering artifacts
///
/// Drops ANSI escape sequences, carriage returns, backspace/delete and other
/// ASCII control characters except tab and newline.
fn sanitize_for_tui(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\x1b' => {
                // ESC [ <params> <letter>
                if chars.peek() == Some(&'[') {
                    chars.next();
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            c if c.is_ascii_control() && c != '\t' && c != '\n' => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Parse markdown and lay it out in one go
pub fn render_markdown(markdown: &str, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let sanitized = sanitize_for_tui(markdown);
    segments_to_lines(&parse_markdown(&sanitized), width, theme)
}

/// Wrap text without interpreting markdown (what the user typed)
pub fn render_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    sanitize_for_tui(text)
        .split('\n')
        .flat_map(|line| wrap_text(line, width))
        .map(|line| Line::from(Span::styled(line, style)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::demo_reply;
    use crate::model::AgentMode;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_nested_emphasis() {
        let segments = parse_markdown("***both*** and *just italic*");
        assert_eq!(
            segments[0],
            Segment::Text {
                text: "both".into(),
                emphasis: Emphasis {
                    bold: true,
                    italic: true,
                    strike: false
                }
            }
        );
        assert!(segments.iter().any(|s| matches!(
            s,
            Segment::Text { text, emphasis } if text == "just italic" && emphasis.italic && !emphasis.bold
        )));
    }

    #[test]
    fn test_ordered_list_numbers() {
        let segments = parse_markdown("3. first\n4. second\n");
        let numbers: Vec<u64> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::ListItemStart { number, ordered: true, .. } => Some(*number),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, [3, 4]);
    }

    #[test]
    fn test_demo_reply_layout() {
        let theme = Theme::default();
        let reply = demo_reply("Is an NDA enforceable in India?", AgentMode::Legal);
        let lines = plain(&render_markdown(&reply, 60, &theme));

        assert_eq!(lines[0], "Legal Expert (Demo Mode)");
        assert!(lines.iter().any(|l| l == "1. Sign up for a free account"));
        assert!(lines.iter().any(|l| l.starts_with("│ This is a demonstration")));
        // Every wrapped quote line keeps its bar
        let quote_lines = lines.iter().filter(|l| l.starts_with("│ ")).count();
        assert!(quote_lines >= 2);
        assert!(lines.iter().all(|l| l.width() <= 60));
    }

    #[test]
    fn test_code_block_and_inline_code() {
        let theme = Theme::default();
        let md = "Use `s. 27`:\n\n```\nline one\nline two\n```\n";
        let lines = plain(&render_markdown(md, 40, &theme));
        assert_eq!(lines[0], "Use s. 27:");
        assert!(lines.contains(&"  line one".to_string()));
        assert!(lines.contains(&"  line two".to_string()));
    }

    #[test]
    fn test_table_rows() {
        let theme = Theme::default();
        let md = "| Act | Section |\n|---|---|\n| Contract Act | 27 |\n";
        let lines = plain(&render_markdown(md, 40, &theme));
        assert_eq!(lines[0], "Act │ Section");
        assert!(lines[1].starts_with('─'));
        assert_eq!(lines[2], "Contract Act │ 27");
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(wrapped, ["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_plain_keeps_asterisks() {
        let lines = plain(&render_plain("**not bold**\nsecond", 40, Style::default()));
        assert_eq!(lines, ["**not bold**", "second"]);
    }

    #[test]
    fn test_sanitize_strips_escapes() {
        assert_eq!(sanitize_for_tui("a\x1b[31mred\x1b[0m\r\n"), "ared\n");
    }
}

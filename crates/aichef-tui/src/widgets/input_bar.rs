//! Full-width input bar widget.
//!
//! Always visible at the bottom of the screen. Multi-line input uses Ctrl+J
//! for newlines; the view follows the cursor line.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::input::TextInputState;
use crate::theme::Theme;

/// Most input lines shown before the bar starts scrolling.
pub const MAX_INPUT_LINES: u16 = 6;

/// Full-width input bar for text entry.
pub struct InputBar<'a> {
    input: &'a TextInputState,
    theme: &'a Theme,
    title: &'a str,
    placeholder: &'a str,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a TextInputState, theme: &'a Theme) -> Self {
        Self {
            input,
            theme,
            title: "",
            placeholder: "",
        }
    }

    #[must_use]
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Hint shown while the input is empty.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Height the bar wants for its current content, borders included.
    #[allow(clippy::cast_possible_truncation)]
    pub fn desired_height(input: &TextInputState) -> u16 {
        let lines = input.content().split('\n').count().max(1);
        (lines as u16).min(MAX_INPUT_LINES) + 2
    }

    /// Build display lines and the index of the line holding the cursor.
    fn build_input_lines(&self) -> (Vec<Line<'static>>, usize) {
        let (cursor_line, cursor_col) = self.input.cursor_line_col();
        let text_style = Style::default().fg(self.theme.text);
        let cursor_style = Style::default().fg(self.theme.primary);

        if self.input.is_empty() {
            let spans = vec![
                Span::styled("> ", cursor_style),
                Span::styled("█", cursor_style),
                Span::styled(
                    self.placeholder.to_string(),
                    Style::default().fg(self.theme.muted),
                ),
            ];
            return (vec![Line::from(spans)], 0);
        }

        let lines = self
            .input
            .content()
            .split('\n')
            .enumerate()
            .map(|(idx, text)| {
                let prefix = if idx == 0 { "> " } else { "  " };
                let mut spans = vec![Span::styled(prefix, cursor_style)];
                if idx == cursor_line {
                    let before: String = text.chars().take(cursor_col).collect();
                    let after: String = text.chars().skip(cursor_col).collect();
                    spans.push(Span::styled(before, text_style));
                    spans.push(Span::styled("█", cursor_style));
                    spans.push(Span::styled(after, text_style));
                } else {
                    spans.push(Span::styled(text.to_string(), text_style));
                }
                Line::from(spans)
            })
            .collect();

        (lines, cursor_line)
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused));
        if !self.title.is_empty() {
            block = block
                .title(format!(" {} ", self.title))
                .title_style(Style::default().fg(self.theme.subtext));
        }

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let (lines, cursor_line) = self.build_input_lines();
        let height = inner.height as usize;
        let skip = (cursor_line + 1).saturating_sub(height);
        let visible: Vec<Line<'static>> = lines.into_iter().skip(skip).take(height).collect();

        Paragraph::new(visible).render(inner, buf);
    }
}

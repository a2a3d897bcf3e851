//! Transcript pane.
//!
//! Turns are laid out top to bottom and the view is anchored to the newest
//! line; scrolling moves the window up from the bottom.
//!
//! ```text
//! ┌ The AI Chef ─────────────────────────────┐
//! │You  14:02                                │
//! │  Something quick with eggs?              │
//! │                                          │
//! │The AI Chef  14:02                        │
//! │  • Step 1: whisk the eggs                │
//! │  ▣ [Recipe step image] http://...        │
//! └──────────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use aichef_engine::render::summarize_source;
use aichef_engine::{Block as TurnBlock, RenderedTurn, Role};

use crate::text::{render_markdown, wrap_lines};
use crate::theme::Theme;

/// Indentation of turn bodies under their header.
const BODY_INDENT: &str = "  ";

/// Shown before the first message.
pub const EMPTY_TRANSCRIPT_HINT: &str =
    "Ask for a recipe, or attach a photo of your ingredients with Ctrl+O.";

/// Lay out rendered turns as wrapped lines for a pane `width` cells wide.
pub fn transcript_lines(
    turns: &[RenderedTurn],
    theme: &Theme,
    assistant_name: &str,
    width: usize,
) -> Vec<Line<'static>> {
    let body_width = width.saturating_sub(BODY_INDENT.len());
    let mut lines = Vec::new();

    for turn in turns {
        let label = match turn.role {
            Role::User => "You",
            Role::Error => "Error",
            Role::Assistant | Role::Fallback | Role::Placeholder => assistant_name,
        };
        lines.push(Line::from(vec![
            Span::styled(label.to_string(), theme.role_header(turn.role)),
            Span::styled(format!("  {}", turn.time), Style::default().fg(theme.muted)),
        ]));

        let body: Vec<Line<'static>> = turn
            .blocks
            .iter()
            .flat_map(|block| block_lines(block, turn.role, theme))
            .collect();
        for line in wrap_lines(body, body_width) {
            let mut spans = vec![Span::raw(BODY_INDENT)];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
    }

    lines.pop();
    lines
}

fn block_lines(block: &TurnBlock, role: Role, theme: &Theme) -> Vec<Line<'static>> {
    match block {
        TurnBlock::Plain(text) => text
            .split('\n')
            .map(|line| Line::from(Span::styled(line.to_string(), theme.role_body(role))))
            .collect(),
        TurnBlock::Markup(lines) if matches!(role, Role::Assistant | Role::Fallback) => {
            render_markdown(&lines.join("\n"), theme)
        }
        TurnBlock::Markup(lines) => lines
            .iter()
            .map(|line| Line::from(Span::styled(line.clone(), theme.role_body(role))))
            .collect(),
        TurnBlock::Image {
            source,
            alt,
            mime_type,
        } => {
            let mut spans = vec![
                Span::styled("▣ ", Style::default().fg(theme.info)),
                Span::styled(
                    format!("[{alt}] "),
                    Style::default()
                        .fg(theme.subtext)
                        .add_modifier(Modifier::ITALIC),
                ),
                Span::styled(
                    summarize_source(source),
                    Style::default()
                        .fg(theme.info)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ];
            if let Some(mime_type) = mime_type {
                spans.push(Span::styled(
                    format!(" ({mime_type})"),
                    Style::default().fg(theme.muted),
                ));
            }
            vec![Line::from(spans)]
        }
    }
}

/// Scrollable, bottom-anchored transcript pane.
pub struct TranscriptView<'a> {
    lines: Vec<Line<'static>>,
    theme: &'a Theme,
    title: &'a str,
    scroll_from_bottom: usize,
}

impl<'a> TranscriptView<'a> {
    /// Create a view over already laid-out lines.
    pub fn new(lines: Vec<Line<'static>>, theme: &'a Theme) -> Self {
        Self {
            lines,
            theme,
            title: "",
            scroll_from_bottom: 0,
        }
    }

    #[must_use]
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Lines to scroll up from the newest one. Clamped when rendering.
    #[must_use]
    pub fn scroll_from_bottom(mut self, scroll: usize) -> Self {
        self.scroll_from_bottom = scroll;
        self
    }

    /// Largest useful scroll offset for a pane of `height` inner rows.
    pub fn max_scroll(line_count: usize, height: usize) -> usize {
        line_count.saturating_sub(height)
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(self.theme.chef)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.base));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.lines.is_empty() {
            let hint = Line::from(Span::styled(
                EMPTY_TRANSCRIPT_HINT,
                Style::default().fg(self.theme.muted),
            ));
            let hint_area = Rect::new(inner.x + 1, inner.y + inner.height / 2, inner.width - 1, 1);
            Paragraph::new(hint).render(hint_area, buf);
            return;
        }

        let height = inner.height as usize;
        let max_scroll = Self::max_scroll(self.lines.len(), height);
        let start = max_scroll - self.scroll_from_bottom.min(max_scroll);
        let visible: Vec<Line<'static>> = self.lines.into_iter().skip(start).take(height).collect();

        Paragraph::new(visible).render(inner, buf);
    }
}

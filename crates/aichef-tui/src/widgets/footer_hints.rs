//! Footer status bar widget.
//!
//! `Waiting for reply                [Enter] send │ [Ctrl+O] image │ ...`
//!
//! The left side shows the latest notice if there is one, otherwise the
//! exchange phase. Key hints are right-aligned and give way to the status.

use aichef_engine::ExchangePhase;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{InputMode, Notice, NoticeLevel};
use crate::text::{truncate_to_width, visual_width};
use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Ctrl+O").
    pub key: &'static str,
    /// What it does (e.g., "image").
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Hints for the active input mode, most important first.
pub fn hints_for_mode(mode: InputMode) -> Vec<KeyHint> {
    match mode {
        InputMode::Message => vec![
            KeyHint::new("Enter", "send"),
            KeyHint::new("Ctrl+J", "newline"),
            KeyHint::new("Ctrl+O", "image"),
            KeyHint::new("Ctrl+T", "narrate"),
            KeyHint::new("Ctrl+C", "quit"),
        ],
        InputMode::AttachPath => vec![
            KeyHint::new("Enter", "attach"),
            KeyHint::new("Esc", "cancel"),
        ],
    }
}

/// Short status text for a phase.
pub fn phase_label(phase: ExchangePhase) -> &'static str {
    match phase {
        ExchangePhase::Idle => "Ready",
        ExchangePhase::Composing => "Composing",
        ExchangePhase::Submitting => "Sending",
        ExchangePhase::AwaitingReply => "Waiting for reply",
        ExchangePhase::Resolved => "Reply received",
        ExchangePhase::Failed => "Failed",
    }
}

/// Footer status bar widget.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
    phase: ExchangePhase,
    notice: Option<&'a Notice>,
}

impl<'a> FooterHints<'a> {
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self {
            hints,
            theme,
            phase: ExchangePhase::Idle,
            notice: None,
        }
    }

    #[must_use]
    pub fn phase(mut self, phase: ExchangePhase) -> Self {
        self.phase = phase;
        self
    }

    #[must_use]
    pub fn notice(mut self, notice: Option<&'a Notice>) -> Self {
        self.notice = notice;
        self
    }
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let total_width = area.width as usize;

        let (status, status_style) = match self.notice {
            Some(notice) => {
                let color = match notice.level {
                    NoticeLevel::Info => self.theme.info,
                    NoticeLevel::Warning => self.theme.warning,
                    NoticeLevel::Error => self.theme.error,
                };
                (notice.text.as_str(), Style::default().fg(color))
            }
            None => (
                phase_label(self.phase),
                Style::default().fg(self.theme.subtext),
            ),
        };
        let left = format!(" {}", truncate_to_width(status, total_width.saturating_sub(1)));
        let left_width = visual_width(&left);

        // Hints are dropped from the end until the rest fits
        let mut right_spans = Vec::new();
        let mut right_width = 0;
        for hint in self.hints {
            let separator = if right_spans.is_empty() { "" } else { " │ " };
            let width = visual_width(separator) + hint.key.len() + hint.action.len() + 3;
            if left_width + 1 + right_width + width > total_width {
                break;
            }
            right_width += width;
            if !separator.is_empty() {
                right_spans.push(Span::styled(separator, Style::default().fg(self.theme.muted)));
            }
            right_spans.push(Span::styled("[", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(hint.key, Style::default().fg(self.theme.primary)));
            right_spans.push(Span::styled("] ", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(hint.action, Style::default().fg(self.theme.subtext)));
        }

        let padding = total_width.saturating_sub(left_width + right_width);
        let mut spans = vec![Span::styled(left, status_style), Span::raw(" ".repeat(padding))];
        spans.extend(right_spans);

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

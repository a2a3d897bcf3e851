//! Markdown styling configuration.
//!
//! Provides [`MarkdownStyles`] which maps markdown elements to ratatui styles.

use ratatui::style::{Modifier, Style};

use crate::theme::Theme;

/// Styles for rendering markdown elements.
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    /// H1 header style.
    pub h1: Style,
    /// H2 header style.
    pub h2: Style,
    /// H3+ header style.
    pub h3: Style,
    /// Inline code style.
    pub code: Style,
    /// Code block line style.
    pub code_block: Style,
    pub emphasis: Style,
    pub strong: Style,
    /// Bullet or number in front of a list item.
    pub list_marker: Style,
    pub link: Style,
    pub blockquote: Style,
    /// Normal text style.
    pub text: Style,
    pub strikethrough: Style,
}

impl MarkdownStyles {
    /// Create styles from a theme.
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            h1: Style::default()
                .fg(theme.chef)
                .add_modifier(Modifier::BOLD),
            h2: Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
            h3: Style::default()
                .fg(theme.subtext)
                .add_modifier(Modifier::BOLD),
            code: Style::default()
                .fg(theme.secondary)
                .bg(theme.surface),
            code_block: Style::default()
                .fg(theme.secondary)
                .bg(theme.surface),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            list_marker: Style::default().fg(theme.chef),
            link: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::UNDERLINED),
            blockquote: Style::default()
                .fg(theme.subtext)
                .add_modifier(Modifier::ITALIC),
            text: Style::default().fg(theme.text),
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),
        }
    }
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}

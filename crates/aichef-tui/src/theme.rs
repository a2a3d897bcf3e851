//! Catppuccin Mocha color palette for the TUI.

use ratatui::style::{Color, Modifier, Style};

use aichef_engine::Role;

/// Theme color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    // Backgrounds
    pub base: Color,
    pub surface: Color,

    // Foregrounds
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,

    // Accents
    pub primary: Color,
    pub secondary: Color,
    pub chef: Color,

    // Semantic
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Borders
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

impl Theme {
    /// Catppuccin Mocha theme (default dark theme).
    pub fn mocha() -> Self {
        Self {
            base: Color::Rgb(30, 30, 46),    // #1e1e2e
            surface: Color::Rgb(49, 50, 68), // #313244

            text: Color::Rgb(205, 214, 244),    // #cdd6f4
            subtext: Color::Rgb(166, 173, 200), // #a6adc8
            muted: Color::Rgb(108, 112, 134),   // #6c7086

            primary: Color::Rgb(180, 190, 254),   // #b4befe (lavender)
            secondary: Color::Rgb(148, 226, 213), // #94e2d5 (teal)
            chef: Color::Rgb(250, 179, 135),      // #fab387 (peach)

            success: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
            warning: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
            error: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
            info: Color::Rgb(137, 180, 250),    // #89b4fa (blue)

            border: Color::Rgb(69, 71, 90),            // #45475a
            border_focused: Color::Rgb(180, 190, 254), // #b4befe (lavender)
        }
    }

    /// Style of the header line that opens a turn.
    pub fn role_header(&self, role: Role) -> Style {
        let color = match role {
            Role::User => self.primary,
            Role::Assistant | Role::Fallback => self.chef,
            Role::Placeholder => self.muted,
            Role::Error => self.error,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Style of a turn's body text when it is not interpreted as markup.
    pub fn role_body(&self, role: Role) -> Style {
        match role {
            Role::Placeholder => Style::default()
                .fg(self.muted)
                .add_modifier(Modifier::ITALIC),
            Role::Error => Style::default().fg(self.error),
            _ => Style::default().fg(self.text),
        }
    }
}

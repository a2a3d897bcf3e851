//! Preview strip for the staged image.
//!
//! `▣ dish.png  image/png · 12.4 KB               [Ctrl+X] remove`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use aichef_engine::StagedAttachment;

use crate::text::{truncate_to_width, visual_width};
use crate::theme::Theme;

/// One-line summary of the staged attachment.
pub struct AttachmentStrip<'a> {
    attachment: &'a StagedAttachment,
    theme: &'a Theme,
}

impl<'a> AttachmentStrip<'a> {
    pub fn new(attachment: &'a StagedAttachment, theme: &'a Theme) -> Self {
        Self { attachment, theme }
    }
}

impl Widget for AttachmentStrip<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hint = "[Ctrl+X] remove";
        let details = format!(
            "  {} · {}",
            self.attachment.origin.media_type,
            format_size(self.attachment.size_bytes)
        );

        let width = area.width as usize;
        let name_room = width.saturating_sub(2 + visual_width(&details) + hint.len() + 1);
        let name = truncate_to_width(&self.attachment.origin.name(), name_room);

        let used = 2 + visual_width(&name) + visual_width(&details);
        let padding = width.saturating_sub(used + hint.len());

        let line = Line::from(vec![
            Span::styled("▣ ", Style::default().fg(self.theme.info)),
            Span::styled(
                name,
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(details, Style::default().fg(self.theme.subtext)),
            Span::raw(" ".repeat(padding)),
            Span::styled(hint, Style::default().fg(self.theme.muted)),
        ]);
        Paragraph::new(line)
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

/// Human-readable file size.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / MB as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;
    use aichef_engine::SelectedFile;
    use insta::assert_snapshot;

    fn staged(name: &str, size_bytes: u64) -> StagedAttachment {
        StagedAttachment {
            preview_source: "data:image/png;base64,AA==".into(),
            origin: SelectedFile::from_path(name),
            size_bytes,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(8), "8 B");
        assert_eq!(format_size(12_697), "12.4 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_strip_layout() {
        let theme = Theme::default();
        let attachment = staged("dish.png", 8);
        let area = Rect::new(0, 0, 50, 1);
        let mut buf = Buffer::empty(area);
        AttachmentStrip::new(&attachment, &theme).render(area, &mut buf);

        assert_snapshot!(buffer_to_string(&buf), @"▣ dish.png  image/png · 8 B        [Ctrl+X] remove");
    }

    #[test]
    fn test_long_name_truncated() {
        let theme = Theme::default();
        let attachment = staged("a-very-long-photo-of-the-fridge-contents.jpeg", 2048);
        let area = Rect::new(0, 0, 50, 1);
        let mut buf = Buffer::empty(area);
        AttachmentStrip::new(&attachment, &theme).render(area, &mut buf);

        let text = buffer_to_string(&buf);
        assert!(text.contains("..."));
        assert!(text.contains("image/jpeg · 2.0 KB"));
        assert!(text.ends_with("[Ctrl+X] remove"));
    }
}

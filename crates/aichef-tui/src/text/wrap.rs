//! Wrapping for styled ratatui Lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::width::visual_width;

/// Wrap every line to fit within `width` cells, keeping span styles.
///
/// A width of zero returns the lines unchanged.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }

    let mut result = Vec::with_capacity(lines.len());
    for line in lines {
        result.extend(wrap_line(line, width));
    }
    result
}

/// Wrap a single Line. Returns one or more Lines with the original styling.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let total_width: usize = line.spans.iter().map(|s| visual_width(&s.content)).sum();
    if total_width <= width {
        return vec![line];
    }

    let chars_with_styles: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();
    let plain_text: String = chars_with_styles.iter().map(|(ch, _)| ch).collect();

    let mut result = Vec::new();
    let mut char_idx = 0;

    for wrapped in textwrap::wrap(&plain_text, width) {
        // textwrap drops the whitespace it broke at
        while char_idx < chars_with_styles.len() {
            let (ch, _) = chars_with_styles[char_idx];
            if ch.is_whitespace() && !wrapped.starts_with(ch) {
                char_idx += 1;
            } else {
                break;
            }
        }

        let mut spans = Vec::new();
        let mut current_style: Option<Style> = None;
        let mut current_text = String::new();

        for expected in wrapped.chars() {
            let Some(&(ch, style)) = chars_with_styles.get(char_idx) else {
                current_text.push(expected);
                continue;
            };
            char_idx += 1;

            match current_style {
                Some(s) if s != style => {
                    spans.push(Span::styled(std::mem::take(&mut current_text), s));
                    current_style = Some(style);
                }
                None => current_style = Some(style),
                Some(_) => {}
            }
            current_text.push(ch);
        }

        if !current_text.is_empty() {
            spans.push(Span::styled(current_text, current_style.unwrap_or_default()));
        }
        result.push(Line::from(spans));
    }

    if result.is_empty() {
        result.push(Line::from(""));
    }
    result
}

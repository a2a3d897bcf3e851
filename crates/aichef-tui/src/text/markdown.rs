//! Markdown rendering using pulldown-cmark.
//!
//! Provides [`render_markdown`] to convert assistant text to styled ratatui
//! Lines. Line breaks in the source are kept as line breaks, the way the
//! chef's replies are meant to be read.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::theme::Theme;

use super::styles::MarkdownStyles;

/// Render markdown text to styled ratatui Lines.
///
/// Trailing blank lines are dropped so consecutive blocks stack tightly.
pub fn render_markdown(input: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(input, options);
    let styles = MarkdownStyles::from_theme(theme);

    let mut renderer = MarkdownRenderer::new(styles);
    renderer.run(parser);

    let mut lines = renderer.lines;
    while lines.last().is_some_and(|line| line.spans.is_empty()) {
        lines.pop();
    }
    lines
}

struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    styles: MarkdownStyles,
    /// Stack of active styles for nested formatting.
    style_stack: Vec<Style>,
    current_spans: Vec<Span<'static>>,
    /// Current nesting depth of lists.
    indent_level: usize,
    in_code_block: bool,
    in_blockquote: bool,
    /// Stack of ordered-list counters; `None` for bullet lists.
    list_stack: Vec<Option<u64>>,
    /// Pending list marker to prepend to next text.
    pending_list_marker: Option<String>,
    /// Task list checkbox state (Some(checked) if in task item).
    task_checkbox: Option<bool>,
}

impl MarkdownRenderer {
    fn new(styles: MarkdownStyles) -> Self {
        Self {
            lines: Vec::new(),
            styles,
            style_stack: Vec::new(),
            current_spans: Vec::new(),
            indent_level: 0,
            in_code_block: false,
            in_blockquote: false,
            list_stack: Vec::new(),
            pending_list_marker: None,
            task_checkbox: None,
        }
    }

    fn run<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            self.handle_event(event);
        }
        self.flush_line();
    }

    #[allow(clippy::too_many_lines)]
    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_line();
                let style = self.heading_style(level);
                self.style_stack.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush_line();
                self.style_stack.pop();
            }

            Event::Start(Tag::Emphasis) => {
                self.style_stack.push(self.styles.emphasis);
            }
            Event::Start(Tag::Strong) => {
                self.style_stack.push(self.styles.strong);
            }
            Event::Start(Tag::Strikethrough) => {
                self.style_stack.push(self.styles.strikethrough);
            }
            Event::Start(Tag::Link { .. }) => {
                self.style_stack.push(self.styles.link);
            }
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_line();
                self.in_code_block = false;
            }

            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.indent_level += 1;
                self.list_stack.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.indent_level = self.indent_level.saturating_sub(1);
                self.list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                let indent = "  ".repeat(self.indent_level.saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.pending_list_marker = Some(marker);
            }
            Event::End(TagEnd::Item) => {
                self.flush_line();
                self.task_checkbox = None;
            }
            Event::TaskListMarker(checked) => {
                self.task_checkbox = Some(checked);
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = true;
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = false;
            }

            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                if self.indent_level == 0 {
                    self.lines.push(Line::from(""));
                }
            }

            Event::Text(text) => {
                self.add_text(&text);
            }
            Event::Code(code) => {
                self.take_list_marker();
                self.current_spans
                    .push(Span::styled(format!("`{code}`"), self.styles.code));
            }
            Event::Html(html) => {
                for line in html.lines() {
                    self.add_text(line);
                    self.flush_line();
                }
            }

            Event::SoftBreak | Event::HardBreak => {
                self.flush_line();
            }

            Event::Start(
                Tag::Paragraph
                | Tag::Image { .. }
                | Tag::Table(_)
                | Tag::TableHead
                | Tag::TableRow
                | Tag::TableCell
                | Tag::FootnoteDefinition(_)
                | Tag::MetadataBlock(_)
                | Tag::HtmlBlock,
            )
            | Event::End(
                TagEnd::Image
                | TagEnd::Table
                | TagEnd::TableHead
                | TagEnd::TableRow
                | TagEnd::TableCell
                | TagEnd::FootnoteDefinition
                | TagEnd::MetadataBlock(_)
                | TagEnd::HtmlBlock,
            )
            | Event::InlineHtml(_)
            | Event::FootnoteReference(_)
            | Event::Rule => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                let indent = "  ".repeat(self.indent_level.saturating_sub(1));
                self.current_spans.push(Span::styled(
                    format!("{indent}  {line}"),
                    self.styles.code_block,
                ));
                self.flush_line();
            }
            return;
        }

        self.take_list_marker();

        if self.in_blockquote && self.current_spans.is_empty() {
            self.current_spans
                .push(Span::styled("> ".to_string(), self.styles.blockquote));
        }

        let style = if self.in_blockquote {
            self.current_style().patch(self.styles.blockquote)
        } else {
            self.current_style()
        };
        self.current_spans.push(Span::styled(text.to_string(), style));
    }

    fn take_list_marker(&mut self) {
        if let Some(marker) = self.pending_list_marker.take() {
            self.current_spans
                .push(Span::styled(marker, self.styles.list_marker));
            if let Some(checked) = self.task_checkbox.take() {
                let checkbox = if checked { "[x] " } else { "[ ] " };
                self.current_spans
                    .push(Span::styled(checkbox, self.styles.list_marker));
            }
        }
    }

    fn current_style(&self) -> Style {
        let mut style = self.styles.text;
        for s in &self.style_stack {
            style = style.patch(*s);
        }
        style
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self.styles.h1,
            HeadingLevel::H2 => self.styles.h2,
            _ => self.styles.h3,
        }
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }
}

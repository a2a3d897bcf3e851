//! Application state for the chat screen.
//!
//! [`App`] owns the exchange controller and the UI-only state around it:
//! the two text fields, the transient notice and the scroll position. Key
//! handling never blocks; work that has to wait (a request, reading an image)
//! is returned as a [`Command`] for the event loop to run.

use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::Widget,
};
use tracing::{debug, warn};

use aichef_engine::narration::NO_NARRATION_TEXT;
use aichef_engine::{
    prepare, project_transcript, AttachmentError, Config, ExchangeController, ExchangeReport,
    LogNarrator, PendingExchange, RawReply, SelectedFile, StagedAttachment, Transport,
    TransportFailure,
};

use crate::event::{key_to_action, Action};
use crate::input::TextInputState;
use crate::theme::Theme;
use crate::widgets::{
    hints_for_mode, transcript_lines, AttachmentStrip, FooterHints, InputBar, TranscriptView,
};

/// How long a notice stays in the footer.
const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Lines moved per mouse wheel step.
const WHEEL_STEP: usize = 3;

/// Lines moved per PgUp/PgDn.
const PAGE_STEP: usize = 10;

/// Which field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Composing the message.
    Message,
    /// Typing the path of an image to attach.
    AttachPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A short-lived message shown in the footer.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub expires_at: Instant,
}

/// Work the event loop has to run off the UI path.
#[derive(Debug)]
pub enum Command {
    /// Send a committed message and hand the result to [`App::finish_exchange`].
    SendRequest(PendingExchange),
    /// Read an image and hand the result to [`App::finish_decode`].
    DecodeAttachment(SelectedFile),
}

/// Chat screen state.
pub struct App {
    controller: ExchangeController,
    pub input: TextInputState,
    pub path_input: TextInputState,
    pub mode: InputMode,
    pub notice: Option<Notice>,
    /// Lines scrolled up from the newest transcript line.
    pub scroll_from_bottom: usize,
    /// Largest scroll offset seen at the last render.
    max_scroll: Cell<usize>,
    pub should_quit: bool,
    pub theme: Theme,
    assistant_name: String,
}

impl App {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            controller: ExchangeController::new(transport, config.submit_policy),
            input: TextInputState::new(),
            path_input: TextInputState::new(),
            mode: InputMode::Message,
            notice: None,
            scroll_from_bottom: 0,
            max_scroll: Cell::new(0),
            should_quit: false,
            theme: Theme::default(),
            assistant_name: config.assistant_name.clone(),
        }
    }

    pub fn controller(&self) -> &ExchangeController {
        &self.controller
    }

    /// Transport handle for running requests in a task.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.controller.transport()
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key_to_action(key) {
            Action::Quit => {
                self.should_quit = true;
                return None;
            }
            Action::Attach => {
                self.mode = InputMode::AttachPath;
                self.path_input.clear();
                return None;
            }
            Action::RemoveAttachment => {
                if self.controller.remove_attachment() {
                    self.set_notice("Image removed", NoticeLevel::Info);
                }
                return None;
            }
            Action::Narrate => {
                self.narrate();
                return None;
            }
            Action::Newline => {
                if self.mode == InputMode::Message {
                    self.input.insert('\n');
                    self.sync_input();
                }
                return None;
            }
            Action::PageUp => {
                self.scroll_up(PAGE_STEP);
                return None;
            }
            Action::PageDown => {
                self.scroll_down(PAGE_STEP);
                return None;
            }
            Action::None => {}
        }

        // Unbound control combinations are ignored
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }

        match self.mode {
            InputMode::Message => self.handle_message_key(key),
            InputMode::AttachPath => self.handle_path_key(key),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_up(WHEEL_STEP),
            MouseEventKind::ScrollDown => self.scroll_down(WHEEL_STEP),
            _ => {}
        }
    }

    fn handle_message_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Esc => self.notice = None,
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => self.input.history_prev(),
            KeyCode::Down => self.input.history_next(),
            _ => return None,
        }
        self.sync_input();
        None
    }

    fn handle_path_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                let raw = self.path_input.take();
                self.mode = InputMode::Message;
                // Terminals quote dropped paths
                let path = raw.trim().trim_matches(|c| c == '\'' || c == '"');
                if path.is_empty() {
                    return None;
                }
                match prepare(SelectedFile::from_path(path)) {
                    Ok(file) => return Some(Command::DecodeAttachment(file)),
                    Err(e) => self.set_notice(e.to_string(), NoticeLevel::Warning),
                }
            }
            KeyCode::Esc => {
                self.path_input.clear();
                self.mode = InputMode::Message;
            }
            KeyCode::Char(c) => self.path_input.insert(c),
            KeyCode::Backspace => self.path_input.backspace(),
            KeyCode::Delete => self.path_input.delete(),
            KeyCode::Left => self.path_input.move_left(),
            KeyCode::Right => self.path_input.move_right(),
            KeyCode::Home => self.path_input.move_home(),
            KeyCode::End => self.path_input.move_end(),
            _ => {}
        }
        None
    }

    /// Commit the current message, if there is anything to send.
    fn submit(&mut self) -> Option<Command> {
        self.sync_input();
        let has_content =
            !self.input.content().trim().is_empty() || self.controller.staging().is_present();

        if let Some(pending) = self.controller.begin_submit() {
            self.input.submit();
            self.scroll_from_bottom = 0;
            return Some(Command::SendRequest(pending));
        }

        if has_content {
            self.set_notice(
                "The chef is still answering. Send again once the reply arrives.",
                NoticeLevel::Warning,
            );
        }
        None
    }

    /// Record the result of a request started by [`Command::SendRequest`].
    pub fn finish_exchange(
        &mut self,
        pending: PendingExchange,
        result: Result<RawReply, TransportFailure>,
    ) -> ExchangeReport {
        let report = self.controller.resolve(pending, result);
        self.scroll_from_bottom = 0;
        debug!(turn = report.turn.0, phase = ?report.terminal_phase, "Reply shown");
        report
    }

    /// Record the result of a read started by [`Command::DecodeAttachment`].
    pub fn finish_decode(&mut self, result: Result<StagedAttachment, AttachmentError>) {
        match result {
            Ok(attachment) => {
                let name = attachment.origin.name();
                self.controller.install_attachment(attachment);
                self.set_notice(format!("Attached {name}"), NoticeLevel::Info);
            }
            Err(e) => {
                warn!(error = %e, "Could not attach image");
                self.set_notice(e.to_string(), NoticeLevel::Error);
            }
        }
    }

    fn narrate(&mut self) {
        let text = self.controller.narrate(&LogNarrator);
        if text == NO_NARRATION_TEXT {
            self.set_notice(text, NoticeLevel::Warning);
        } else {
            self.set_notice(
                format!("Imagine this is being narrated: \"{text}\""),
                NoticeLevel::Info,
            );
        }
    }

    /// Expire the notice once its time is up.
    pub fn tick(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| Instant::now() >= n.expires_at)
        {
            self.notice = None;
        }
    }

    pub fn set_notice(&mut self, text: impl Into<String>, level: NoticeLevel) {
        self.notice = Some(Notice {
            text: text.into(),
            level,
            expires_at: Instant::now() + NOTICE_DURATION,
        });
    }

    fn sync_input(&mut self) {
        self.controller.set_input(self.input.content());
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = (self.scroll_from_bottom + lines).min(self.max_scroll.get());
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Draw the chat screen.
    ///
    /// ```text
    /// ┌ The AI Chef ──────────────┐
    /// │ transcript                │
    /// └───────────────────────────┘
    /// ▣ dish.png  image/png · 8 B     (only when an image is staged)
    /// ┌ Message ──────────────────┐
    /// │> █                        │
    /// └───────────────────────────┘
    ///  Ready            [Enter] send │ ...
    /// ```
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let attachment = self.controller.staging().current();
        let (field, title, placeholder) = match self.mode {
            InputMode::Message => (&self.input, "Message", "Ask the chef for a recipe..."),
            InputMode::AttachPath => (&self.path_input, "Image path", "path/to/photo.jpg"),
        };

        let [transcript_area, attachment_area, input_area, footer_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(u16::from(attachment.is_some())),
            Constraint::Length(InputBar::desired_height(field)),
            Constraint::Length(1),
        ])
        .areas(area);

        let inner_width = transcript_area.width.saturating_sub(2) as usize;
        let inner_height = transcript_area.height.saturating_sub(2) as usize;
        let turns = project_transcript(self.controller.transcript());
        let lines = transcript_lines(&turns, &self.theme, &self.assistant_name, inner_width);
        self.max_scroll
            .set(TranscriptView::max_scroll(lines.len(), inner_height));

        TranscriptView::new(lines, &self.theme)
            .title(&self.assistant_name)
            .scroll_from_bottom(self.scroll_from_bottom)
            .render(transcript_area, buf);

        if let Some(attachment) = attachment {
            AttachmentStrip::new(attachment, &self.theme).render(attachment_area, buf);
        }

        InputBar::new(field, &self.theme)
            .title(title)
            .placeholder(placeholder)
            .render(input_area, buf);

        let hints = hints_for_mode(self.mode);
        FooterHints::new(&hints, &self.theme)
            .phase(self.controller.phase())
            .notice(self.notice.as_ref())
            .render(footer_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, render_app_to_string, RecordingTransport};
    use aichef_engine::attachment::NOT_AN_IMAGE_TEXT;
    use aichef_engine::{ExchangePhase, Role, SubmitPolicy};
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(key(KeyCode::Char(c))).is_none());
        }
    }

    fn send(app: &mut App, text: &str) -> PendingExchange {
        type_str(app, text);
        match app.handle_key(key(KeyCode::Enter)) {
            Some(Command::SendRequest(pending)) => pending,
            other => panic!("expected a request, got {other:?}"),
        }
    }

    fn staged() -> StagedAttachment {
        StagedAttachment {
            preview_source: "data:image/png;base64,AA==".into(),
            origin: SelectedFile::from_path("dish.png"),
            size_bytes: 1,
        }
    }

    #[test]
    fn test_typing_syncs_controller() {
        let mut app = create_test_app();
        type_str(&mut app, "eggs");
        assert_eq!(app.controller().input(), "eggs");
        assert_eq!(app.controller().phase(), ExchangePhase::Composing);

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.controller().input(), "egg");
    }

    #[test]
    fn test_enter_commits_and_returns_request() {
        let mut app = create_test_app();
        let pending = send(&mut app, "carbonara please");

        assert_eq!(pending.request.message, "carbonara please");
        assert!(!pending.request.image_present);
        assert!(app.input.is_empty());

        let turns = app.controller().transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Placeholder);
    }

    #[test]
    fn test_blank_enter_does_nothing() {
        let mut app = create_test_app();
        type_str(&mut app, "   ");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert!(app.controller().transcript().is_empty());
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_finish_exchange_replaces_placeholder() {
        let mut app = create_test_app();
        let pending = send(&mut app, "soup");

        let report = app.finish_exchange(
            pending,
            Ok(RawReply::new(
                200,
                r#"{"structured_recipe":[{"type":"text","content":"Simmer for 20 minutes"}]}"#,
            )),
        );

        assert_eq!(report.retired_placeholders, 1);
        let turns = app.controller().transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(app.controller().phase(), ExchangePhase::Idle);
    }

    #[test]
    fn test_ctrl_j_inserts_newline() {
        let mut app = create_test_app();
        type_str(&mut app, "eggs");
        app.handle_key(ctrl('j'));
        type_str(&mut app, "bacon");
        let pending = app.handle_key(key(KeyCode::Enter));

        match pending {
            Some(Command::SendRequest(p)) => assert_eq!(p.request.message, "eggs\nbacon"),
            other => panic!("expected a request, got {other:?}"),
        }
    }

    #[test]
    fn test_attach_non_image_warns_and_keeps_staging() {
        let mut app = create_test_app();
        app.finish_decode(Ok(staged()));

        app.handle_key(ctrl('o'));
        assert_eq!(app.mode, InputMode::AttachPath);
        type_str(&mut app, "notes.txt");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());

        assert_eq!(app.mode, InputMode::Message);
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.text, NOT_AN_IMAGE_TEXT);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(
            app.controller().staging().current().unwrap().origin.name(),
            "dish.png"
        );
    }

    #[test]
    fn test_attach_image_path_returns_decode_command() {
        let mut app = create_test_app();
        app.handle_key(ctrl('o'));
        type_str(&mut app, "'/tmp/My Dish.JPG'");

        match app.handle_key(key(KeyCode::Enter)) {
            Some(Command::DecodeAttachment(file)) => {
                assert_eq!(file.media_type, "image/jpeg");
                assert_eq!(file.name(), "My Dish.JPG");
            }
            other => panic!("expected a decode command, got {other:?}"),
        }
        assert!(app.path_input.is_empty());
    }

    #[test]
    fn test_attach_prompt_escape_cancels() {
        let mut app = create_test_app();
        app.handle_key(ctrl('o'));
        type_str(&mut app, "dish.png");
        assert!(app.handle_key(key(KeyCode::Esc)).is_none());

        assert_eq!(app.mode, InputMode::Message);
        assert!(app.path_input.is_empty());
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_image_only_submit_and_clear() {
        let mut app = create_test_app();
        app.finish_decode(Ok(staged()));
        assert_eq!(app.notice.as_ref().unwrap().text, "Attached dish.png");

        let pending = match app.handle_key(key(KeyCode::Enter)) {
            Some(Command::SendRequest(p)) => p,
            other => panic!("expected a request, got {other:?}"),
        };
        assert!(pending.request.image_present);

        let report = app.finish_exchange(pending, Err(TransportFailure::Network("down".into())));
        assert!(report.cleared_attachment);
        assert!(app.controller().staging().current().is_none());
    }

    #[test]
    fn test_remove_attachment_key() {
        let mut app = create_test_app();
        app.handle_key(ctrl('x'));
        assert!(app.notice.is_none());

        app.finish_decode(Ok(staged()));
        app.handle_key(ctrl('x'));
        assert!(!app.controller().staging().is_present());
        assert_eq!(app.notice.as_ref().unwrap().text, "Image removed");
    }

    #[test]
    fn test_decode_failure_shows_error() {
        let mut app = create_test_app();
        app.finish_decode(Err(AttachmentError::Io {
            path: "/nope/dish.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }));
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("/nope/dish.png"));
    }

    #[test]
    fn test_narrate() {
        let mut app = create_test_app();
        app.handle_key(ctrl('t'));
        assert_eq!(app.notice.as_ref().unwrap().text, NO_NARRATION_TEXT);

        let pending = send(&mut app, "toast");
        app.finish_exchange(
            pending,
            Ok(RawReply::new(
                200,
                r#"{"structured_recipe":[{"type":"text","content":"Butter the bread"}]}"#,
            )),
        );
        app.handle_key(ctrl('t'));
        assert_eq!(
            app.notice.as_ref().unwrap().text,
            "Imagine this is being narrated: \"Butter the bread\""
        );
    }

    #[test]
    fn test_reject_while_awaiting_shows_notice() {
        let config = Config {
            submit_policy: SubmitPolicy::RejectWhileAwaiting,
            ..Config::default()
        };
        let mut app = App::new(&config, Arc::new(RecordingTransport::default()));
        let _pending = send(&mut app, "first");

        type_str(&mut app, "second");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.input.content(), "second");
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn test_quit_and_release_events() {
        let mut app = create_test_app();
        let mut release = key(KeyCode::Char('a'));
        release.kind = KeyEventKind::Release;
        release.state = KeyEventState::NONE;
        app.handle_key(release);
        assert!(app.input.is_empty());

        app.handle_key(ctrl('c'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_history_recall() {
        let mut app = create_test_app();
        let _ = send(&mut app, "pancakes");
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input.content(), "pancakes");
        assert_eq!(app.controller().input(), "pancakes");
    }

    #[test]
    fn test_tick_expires_notice() {
        let mut app = create_test_app();
        app.set_notice("hello", NoticeLevel::Info);
        app.tick();
        assert!(app.notice.is_some());

        app.notice.as_mut().unwrap().expires_at = Instant::now();
        app.tick();
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_render_empty_screen() {
        let app = create_test_app();
        let screen = render_app_to_string(&app, 80, 12);

        assert!(screen.contains("The AI Chef"));
        assert!(screen.contains("Ask for a recipe"));
        assert!(screen.contains("Message"));
        assert!(screen.contains(" Ready"));
        assert!(screen.contains("[Enter] send"));
    }

    #[test]
    fn test_render_conversation_with_attachment() {
        let mut app = create_test_app();
        let pending = send(&mut app, "what goes with basil?");
        app.finish_exchange(
            pending,
            Ok(RawReply::new(
                200,
                r#"{"structured_recipe":[{"type":"text","content":"Tomatoes and **mozzarella**"}]}"#,
            )),
        );
        app.finish_decode(Ok(staged()));

        let screen = render_app_to_string(&app, 80, 16);
        assert!(screen.contains("what goes with basil?"));
        assert!(screen.contains("Tomatoes and mozzarella"));
        assert!(screen.contains("▣ dish.png"));
        assert!(screen.contains("[Ctrl+X] remove"));
    }

    #[test]
    fn test_render_placeholder_while_waiting() {
        let mut app = create_test_app();
        let _pending = send(&mut app, "risotto");
        let screen = render_app_to_string(&app, 80, 12);
        assert!(screen.contains("The AI Chef is thinking..."));
        assert!(screen.contains("Waiting for reply"));
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let mut app = create_test_app();
        let _ = render_app_to_string(&app, 80, 12);
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.scroll_from_bottom, 0);

        for i in 0..10 {
            let pending = send(&mut app, &format!("question {i}"));
            app.finish_exchange(pending, Ok(RawReply::new(200, r#"{"structured_recipe": []}"#)));
        }
        let _ = render_app_to_string(&app, 80, 12);
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.scroll_from_bottom, PAGE_STEP);
        app.handle_key(key(KeyCode::PageDown));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.scroll_from_bottom, 0);
    }
}

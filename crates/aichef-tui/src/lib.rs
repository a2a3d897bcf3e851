//! aichef-tui: Terminal UI for the AI Chef conversational client
//!
//! This crate provides the interactive front end:
//! - Scrollable transcript with markdown for the chef's replies
//! - Multi-line message input with history
//! - Image attachment by path, with a preview strip
//! - Narration of the latest reply

mod app;
mod event;
mod input;
#[cfg(test)]
pub mod test_utils;
mod text;
mod theme;
mod widgets;

pub use aichef_engine;
pub use app::{App, Command, InputMode, Notice, NoticeLevel};
pub use event::{Action, Event, EventHandler};
pub use input::TextInputState;
pub use theme::Theme;

use std::io::{self, stdout};
use std::sync::Arc;

use aichef_engine::{
    decode_preview, AttachmentError, Config, HttpTransport, PendingExchange, RawReply,
    StagedAttachment, Transport, TransportFailure,
};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Results coming back from spawned work.
enum TaskResult {
    Exchange(PendingExchange, Result<RawReply, TransportFailure>),
    Decoded(Result<StagedAttachment, AttachmentError>),
}

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit.
pub async fn run_tui(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let transport = HttpTransport::from_config(config)?;

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Arc::new(transport));
    info!(
        endpoint = %config.endpoint,
        conversation_id = %app.controller().conversation_id(),
        "TUI started"
    );

    // 4 Hz tick rate
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    terminal.show_cursor()?;
    info!("TUI stopped");

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.render(area, frame.buffer_mut());
        })?;

        tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => {
                    if let Some(command) = app.handle_key(key) {
                        tasks.push(spawn_command(command, app.transport(), tx.clone()));
                    }
                }
                Some(Event::Mouse(mouse)) => app.handle_mouse(mouse),
                Some(Event::Tick) => app.tick(),
                // Terminal will handle resize on the next draw
                Some(Event::Resize(_, _)) => {}
                None => break,
            },
            Some(done) = rx.recv() => match done {
                TaskResult::Exchange(pending, result) => {
                    app.finish_exchange(pending, result);
                }
                TaskResult::Decoded(result) => app.finish_decode(result),
            },
        }

        tasks.retain(|handle| !handle.is_finished());

        if app.should_quit {
            if !tasks.is_empty() {
                debug!(pending = tasks.len(), "Aborting unfinished tasks");
            }
            for handle in tasks.drain(..) {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

fn spawn_command(
    command: Command,
    transport: Arc<dyn Transport>,
    tx: mpsc::UnboundedSender<TaskResult>,
) -> JoinHandle<()> {
    match command {
        Command::SendRequest(pending) => tokio::spawn(async move {
            let result = transport.send(&pending.request).await;
            let _ = tx.send(TaskResult::Exchange(pending, result));
        }),
        Command::DecodeAttachment(file) => tokio::spawn(async move {
            let _ = tx.send(TaskResult::Decoded(decode_preview(file).await));
        }),
    }
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

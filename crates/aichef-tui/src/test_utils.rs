//! Test utilities for rendering into buffers and building apps.

use std::sync::{Arc, Mutex};

use aichef_engine::{Config, ExchangeRequest, RawReply, Transport, TransportFailure};
use async_trait::async_trait;
use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::App;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Transport that records requests and never answers on its own.
///
/// Tests hand results to [`App::finish_exchange`] directly.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<ExchangeRequest>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &ExchangeRequest) -> Result<RawReply, TransportFailure> {
        self.requests.lock().unwrap().push(request.clone());
        Err(TransportFailure::Network("test transport does not send".into()))
    }
}

/// Create an app with default config and a recording transport.
pub fn create_test_app() -> App {
    App::new(&Config::default(), Arc::new(RecordingTransport::default()))
}

/// Convert a buffer to a string, one line per row, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Render the whole app into a buffer of the given size.
pub fn render_app_to_string(app: &App, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    app.render(area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Eggs", ratatui::style::Style::default());
        buffer.set_string(0, 1, "Flour", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Eggs\nFlour\n");
    }
}

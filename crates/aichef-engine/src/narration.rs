//! Narration text extraction.
//!
//! Playback itself is an external capability behind [`Narrator`]; this module
//! only decides what text to hand over.

use tracing::info;

use crate::transcript::Transcript;

/// Used when there is nothing to read.
pub const NO_NARRATION_TEXT: &str = "No AI message found to read.";

/// Something that can read text aloud.
pub trait Narrator {
    fn narrate(&self, text: &str);
}

/// Narrator that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNarrator;

impl Narrator for LogNarrator {
    fn narrate(&self, text: &str) {
        info!(chars = text.chars().count(), message = %text, "Narration requested");
    }
}

/// Text of the latest assistant-side turn, joined with newlines.
///
/// Falls back to [`NO_NARRATION_TEXT`] when there is no such turn or it holds
/// no text (images only).
pub fn narration_text(transcript: &Transcript) -> String {
    transcript
        .latest_assistant_side()
        .map(|turn| turn.text_segments().join("\n"))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_NARRATION_TEXT.to_string())
}

/// Extract the narration text and pass it to `narrator`.
pub fn narrate_latest(transcript: &Transcript, narrator: &dyn Narrator) -> String {
    let text = narration_text(transcript);
    narrator.narrate(&text);
    text
}

//! Widgets composing the chat screen.

pub mod attachment;
pub mod footer_hints;
pub mod input_bar;
pub mod transcript;

pub use attachment::AttachmentStrip;
pub use footer_hints::{hints_for_mode, FooterHints, KeyHint};
pub use input_bar::InputBar;
pub use transcript::{transcript_lines, TranscriptView};

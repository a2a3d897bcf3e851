//! aichef-engine: Headless core of the AI Chef conversational client
//!
//! This crate provides everything below the presentation surface:
//! - Attachment staging (at most one image per turn)
//! - The append-only transcript with placeholder tracking
//! - Reply decoding into a closed set of exchange outcomes
//! - Turn rendering and the presentation projection
//! - The exchange controller that drives one turn end to end
//! - The HTTP transport boundary and configuration

pub mod attachment;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod narration;
pub mod render;
pub mod transcript;
pub mod transport;

// Re-export commonly used types
pub use attachment::{
    decode_preview, prepare, AttachmentError, AttachmentStaging, SelectedFile, StagedAttachment,
};
pub use config::{Config, ConfigError, SubmitPolicy, AICHEF_DIR, CONFIG_FILE};
pub use controller::{ExchangeController, ExchangePhase, ExchangeReport, PendingExchange};
pub use decoder::{classify, decode_reply, ExchangeOutcome};
pub use narration::{narration_text, LogNarrator, Narrator};
pub use render::{project_transcript, project_turn, transcript_to_text, Block, RenderedTurn};
pub use transcript::{ContentPart, Role, Transcript, Turn, TurnContent, TurnDraft, TurnId};
pub use transport::{ExchangeRequest, HttpTransport, RawReply, Transport, TransportFailure};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

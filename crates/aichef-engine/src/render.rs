//! Turn rendering.
//!
//! Two steps live here: mapping an [`ExchangeOutcome`] to the turn that gets
//! committed, and projecting committed turns into presentation blocks. The
//! projection is pure; front ends call it after every change and draw the
//! result.
//!
//! User text is always [`Block::Plain`] and must be shown verbatim. Text from
//! the assistant side is [`Block::Markup`]: the assistant is trusted and its
//! text may be interpreted by the front end.

use std::fmt::Write;

use crate::decoder::ExchangeOutcome;
use crate::transcript::{ContentPart, Role, Transcript, Turn, TurnContent, TurnDraft, TurnId};

/// Shown when the assistant replied with an empty part list.
pub const EMPTY_REPLY_TEXT: &str =
    "I couldn't come up with anything for that. Try asking something else!";

/// Shown when a success response had an unexpected shape.
pub const MALFORMED_REPLY_TEXT: &str =
    "Received an unclear response from the AI. Please try again.";

/// Alternative text for reply images.
pub const IMAGE_ALT_TEXT: &str = "Recipe step image";

/// Map an outcome to the turn that records it.
pub fn render_outcome(outcome: &ExchangeOutcome) -> TurnDraft {
    match outcome {
        ExchangeOutcome::Success(parts) => TurnDraft::assistant(parts.clone()),
        ExchangeOutcome::EmptySuccess => TurnDraft::fallback(EMPTY_REPLY_TEXT),
        ExchangeOutcome::BackendError(message) | ExchangeOutcome::TransportError(message) => {
            TurnDraft::error(message.clone())
        }
        ExchangeOutcome::MalformedResponse => TurnDraft::error(MALFORMED_REPLY_TEXT),
    }
}

/// One presentation block of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Literal text. Never interpreted.
    Plain(String),
    /// Trusted text, already split at newlines.
    Markup(Vec<String>),
    /// An image reference.
    Image {
        source: String,
        alt: &'static str,
        mime_type: Option<String>,
    },
}

/// A turn projected for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTurn {
    pub id: TurnId,
    pub role: Role,
    /// Local HH:MM.
    pub time: String,
    pub blocks: Vec<Block>,
    /// Whether the turn can be read aloud.
    pub narratable: bool,
}

/// Project a single turn.
pub fn project_turn(turn: &Turn) -> RenderedTurn {
    let blocks = match (&turn.content, turn.role) {
        (TurnContent::Text(text), Role::User) => vec![Block::Plain(text.clone())],
        (TurnContent::Text(text), _) => vec![markup(text)],
        (TurnContent::Parts(parts), _) => parts.iter().filter_map(project_part).collect(),
    };

    RenderedTurn {
        id: turn.id,
        role: turn.role,
        time: turn.time_str(),
        blocks,
        narratable: turn.role.is_assistant_side(),
    }
}

/// Project every turn in order.
pub fn project_transcript(transcript: &Transcript) -> Vec<RenderedTurn> {
    transcript.turns().iter().map(project_turn).collect()
}

fn project_part(part: &ContentPart) -> Option<Block> {
    match part {
        ContentPart::Text { content } if content.is_empty() => None,
        ContentPart::Text { content } => Some(markup(content)),
        ContentPart::Image { source, .. } if source.is_empty() => None,
        ContentPart::Image { source, mime_type } => Some(Block::Image {
            source: source.clone(),
            alt: IMAGE_ALT_TEXT,
            mime_type: mime_type.clone(),
        }),
    }
}

fn markup(text: &str) -> Block {
    Block::Markup(text.split('\n').map(str::to_string).collect())
}

/// Label for a role when shown as plain text.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Chef",
        Role::Placeholder => "...",
        Role::Error => "Error",
        Role::Fallback => "Chef",
    }
}

/// Render the transcript as plain text, one block per line group.
///
/// Used by the one-shot CLI; images are shown by reference.
pub fn transcript_to_text(transcript: &Transcript) -> String {
    let mut out = String::new();
    for turn in project_transcript(transcript) {
        for (i, block) in turn.blocks.iter().enumerate() {
            let prefix = if i == 0 {
                format!("{}: ", role_label(turn.role))
            } else {
                " ".repeat(role_label(turn.role).len() + 2)
            };
            match block {
                Block::Plain(text) => {
                    let _ = writeln!(out, "{prefix}{text}");
                }
                Block::Markup(lines) => {
                    let indent = " ".repeat(prefix.len());
                    for (j, line) in lines.iter().enumerate() {
                        let lead = if j == 0 { prefix.as_str() } else { indent.as_str() };
                        let _ = writeln!(out, "{lead}{line}");
                    }
                }
                Block::Image { source, alt, .. } => {
                    let _ = writeln!(out, "{prefix}[{alt}: {}]", summarize_source(source));
                }
            }
        }
    }
    out
}

/// Shorten data URIs so they can be shown on one line.
pub fn summarize_source(source: &str) -> String {
    match source.split_once(',') {
        Some((header, payload)) if source.starts_with("data:") => {
            format!("{header},... ({} bytes encoded)", payload.len())
        }
        _ => source.to_string(),
    }
}

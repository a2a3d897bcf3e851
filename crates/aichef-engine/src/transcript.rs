//! Transcript store for a single conversation.
//!
//! The transcript is an append-only log of committed turns. Turns are never
//! reordered or edited; the only removal is the retirement of placeholder
//! turns once an exchange has produced its outcome.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sentinel text shown while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "The AI Chef is thinking...";

/// Who (or what) a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// A structured reply from the assistant.
    Assistant,
    /// Transient "thinking" indicator.
    Placeholder,
    /// A failed exchange.
    Error,
    /// A valid reply that carried no content.
    Fallback,
}

impl Role {
    /// Whether this turn is spoken on the assistant's side of the conversation.
    pub fn is_assistant_side(self) -> bool {
        matches!(self, Role::Assistant | Role::Error | Role::Fallback)
    }
}

/// One unit of a decoded assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    /// A text segment. Newlines become line breaks when presented.
    Text { content: String },
    /// A reference (URL or data URI) to an image that is already available.
    Image {
        #[serde(rename = "content")]
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl ContentPart {
    /// Build a text part, or `None` if the text is empty.
    pub fn text(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        (!content.is_empty()).then_some(Self::Text { content })
    }

    /// Build an image part, or `None` if the reference is empty.
    pub fn image(source: impl Into<String>, mime_type: Option<String>) -> Option<Self> {
        let source = source.into();
        (!source.is_empty()).then_some(Self::Image { source, mime_type })
    }

    /// The text payload, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::Image { .. } => None,
        }
    }
}

/// Body of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnContent {
    /// Raw text. For user turns this is never interpreted as markup.
    Text(String),
    /// An ordered sequence of reply parts.
    Parts(Vec<ContentPart>),
}

/// Sequential identifier of a turn within one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

/// A committed transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub content: TurnContent,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Timestamp formatted for display (HH:MM in local time).
    pub fn time_str(&self) -> String {
        let local: DateTime<Local> = self.created_at.into();
        local.format("%H:%M").to_string()
    }

    /// Renderable text of the turn in display order.
    ///
    /// Image parts contribute nothing.
    pub fn text_segments(&self) -> Vec<&str> {
        match &self.content {
            TurnContent::Text(text) => vec![text.as_str()],
            TurnContent::Parts(parts) => parts.iter().filter_map(ContentPart::as_text).collect(),
        }
    }
}

/// A turn waiting to be committed.
///
/// Placeholder turns have no constructor here; they are only
/// created through [`Transcript::insert_placeholder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDraft {
    role: Role,
    content: TurnContent,
}

impl TurnDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn assistant(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Parts(parts),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            role: Role::Error,
            content: TurnContent::Text(message.into()),
        }
    }

    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            role: Role::Fallback,
            content: TurnContent::Text(message.into()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }
}

/// Append-only, ordered log of turns.
#[derive(Debug)]
pub struct Transcript {
    turns: Vec<Turn>,
    next_id: u64,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            next_id: 1,
        }
    }

    /// All turns in commit order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Look up a turn by id.
    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Commit a turn at the end of the transcript.
    pub fn commit(&mut self, draft: TurnDraft) -> TurnId {
        self.append(draft.role, draft.content)
    }

    /// Insert the "thinking" placeholder.
    pub fn insert_placeholder(&mut self) -> TurnId {
        let id = self.append(Role::Placeholder, TurnContent::Text(PLACEHOLDER_TEXT.into()));
        debug!(turn = id.0, "Placeholder inserted");
        id
    }

    /// Remove every live placeholder turn, returning how many were removed.
    ///
    /// At most one placeholder should ever be live; more than one is logged.
    pub fn retire_placeholders(&mut self) -> usize {
        let before = self.turns.len();
        self.turns.retain(|t| t.role != Role::Placeholder);
        let retired = before - self.turns.len();

        match retired {
            0 => debug!("No placeholder to retire"),
            1 => debug!("Placeholder retired"),
            n => warn!(count = n, "Retired more than one live placeholder"),
        }
        retired
    }

    /// Placeholder turns currently in the transcript.
    pub fn live_placeholders(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.role == Role::Placeholder)
    }

    /// Number of live placeholder turns.
    pub fn placeholder_count(&self) -> usize {
        self.live_placeholders().count()
    }

    /// The most recent turn with role [`Role::Assistant`].
    pub fn latest_assistant(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// The most recent assistant, error, or fallback turn.
    pub fn latest_assistant_side(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role.is_assistant_side())
    }

    fn append(&mut self, role: Role, content: TurnContent) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        self.turns.push(Turn {
            id,
            role,
            content,
            created_at: Utc::now(),
        });
        id
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

//! Exchange controller.
//!
//! Drives one conversational turn from composition to resolution:
//!
//! ```text
//! Idle -> Composing -> Submitting -> AwaitingReply -> {Resolved, Failed} -> Idle
//! ```
//!
//! Submission is split in two so an event loop can run the network call as a
//! separate task: [`ExchangeController::begin_submit`] commits the user turn
//! and the placeholder and hands back the request, and
//! [`ExchangeController::resolve`] takes the transport result and finishes
//! the turn. [`ExchangeController::submit`] does both around the transport.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachment::{AttachmentError, AttachmentStaging, StagedAttachment};
use crate::config::SubmitPolicy;
use crate::decoder::{classify, ExchangeOutcome};
use crate::narration::{narrate_latest, Narrator};
use crate::render::render_outcome;
use crate::transcript::{Transcript, TurnDraft, TurnId};
use crate::transport::{ExchangeRequest, RawReply, Transport, TransportFailure};

/// User turn label when only an image was sent.
pub const IMAGE_ONLY_LABEL: &str = "[Image Uploaded]";

/// Where the controller is in the exchange lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Nothing typed or staged, nothing in flight.
    Idle,
    /// Text or an attachment is being prepared.
    Composing,
    /// The user turn is being committed.
    Submitting,
    /// A request is in flight.
    AwaitingReply,
    /// The last exchange produced a reply.
    Resolved,
    /// The last exchange failed.
    Failed,
}

/// A committed turn whose reply is still outstanding.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    /// What to send.
    pub request: ExchangeRequest,
    /// The user turn that was committed.
    pub user_turn: TurnId,
    /// The placeholder inserted for this exchange.
    pub placeholder: TurnId,
}

/// Summary of a finished exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReport {
    pub outcome: ExchangeOutcome,
    /// The outcome turn that was committed.
    pub turn: TurnId,
    /// How many placeholders were retired before the outcome was committed.
    pub retired_placeholders: usize,
    /// `Resolved` or `Failed`.
    pub terminal_phase: ExchangePhase,
    /// Whether an attachment was cleared when the exchange finished.
    pub cleared_attachment: bool,
}

/// Owns one conversation: transcript, draft text, staged attachment.
pub struct ExchangeController {
    conversation_id: Uuid,
    transport: Arc<dyn Transport>,
    policy: SubmitPolicy,
    transcript: Transcript,
    staging: AttachmentStaging,
    input: String,
    phase: ExchangePhase,
    in_flight: usize,
}

impl ExchangeController {
    /// Create a controller for a new conversation.
    pub fn new(transport: Arc<dyn Transport>, policy: SubmitPolicy) -> Self {
        let conversation_id = Uuid::new_v4();
        debug!(%conversation_id, ?policy, "Conversation created");
        Self {
            conversation_id,
            transport,
            policy,
            transcript: Transcript::new(),
            staging: AttachmentStaging::new(),
            input: String::new(),
            phase: ExchangePhase::Idle,
            in_flight: 0,
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn staging(&self) -> &AttachmentStaging {
        &self.staging
    }

    /// The current draft text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Number of requests sent but not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Shared handle to the transport, for running requests elsewhere.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Replace the draft text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.refresh_composing();
    }

    /// Stage an image from disk. See [`AttachmentStaging::stage`].
    pub async fn stage_attachment(&mut self, path: impl AsRef<Path>) -> Result<(), AttachmentError> {
        let result = self.staging.stage(path).await.map(|_| ());
        self.refresh_composing();
        result
    }

    /// Put an already decoded attachment in place.
    pub fn install_attachment(&mut self, attachment: StagedAttachment) {
        self.staging.install(attachment);
        self.refresh_composing();
    }

    /// Drop the staged attachment, if any.
    pub fn remove_attachment(&mut self) -> bool {
        let removed = self.staging.clear();
        self.refresh_composing();
        removed
    }

    /// Whether a submit right now would be accepted.
    pub fn can_submit(&self) -> bool {
        let has_content = !self.input.trim().is_empty() || self.staging.is_present();
        let blocked = self.policy == SubmitPolicy::RejectWhileAwaiting && self.in_flight > 0;
        has_content && !blocked
    }

    /// Commit the user turn and placeholder, returning the request to send.
    ///
    /// Returns `None`, with nothing committed, when there is no text and no
    /// attachment, or when the submit policy forbids overlapping exchanges.
    pub fn begin_submit(&mut self) -> Option<PendingExchange> {
        let message = self.input.trim().to_string();
        let image_present = self.staging.is_present();

        if message.is_empty() && !image_present {
            debug!("Empty message and no image, not sending");
            return None;
        }
        if self.policy == SubmitPolicy::RejectWhileAwaiting && self.in_flight > 0 {
            info!(in_flight = self.in_flight, "Reply pending, submit ignored");
            return None;
        }

        self.phase = ExchangePhase::Submitting;
        let label = if message.is_empty() {
            IMAGE_ONLY_LABEL.to_string()
        } else {
            message.clone()
        };
        let user_turn = self.transcript.commit(TurnDraft::user(label));
        self.input.clear();
        let placeholder = self.transcript.insert_placeholder();

        self.in_flight += 1;
        self.phase = ExchangePhase::AwaitingReply;
        info!(
            conversation_id = %self.conversation_id,
            message_len = message.len(),
            image_present,
            "Message committed"
        );

        Some(PendingExchange {
            request: ExchangeRequest {
                message,
                image_present,
            },
            user_turn,
            placeholder,
        })
    }

    /// Finish an exchange with whatever the transport produced.
    ///
    /// Placeholders are retired before the outcome is classified, and the
    /// staged attachment is cleared whatever the outcome.
    pub fn resolve(
        &mut self,
        pending: PendingExchange,
        result: Result<RawReply, TransportFailure>,
    ) -> ExchangeReport {
        let retired_placeholders = self.transcript.retire_placeholders();
        if retired_placeholders != 1 {
            warn!(
                placeholder = pending.placeholder.0,
                retired = retired_placeholders,
                "Unexpected number of live placeholders"
            );
        }

        let outcome = classify(result);
        let turn = self.transcript.commit(render_outcome(&outcome));
        let terminal_phase = if outcome.is_failure() {
            ExchangePhase::Failed
        } else {
            ExchangePhase::Resolved
        };
        self.phase = terminal_phase;
        info!(
            conversation_id = %self.conversation_id,
            user_turn = pending.user_turn.0,
            outcome = outcome_name(&outcome),
            "Exchange finished"
        );

        let cleared_attachment = self.staging.clear();
        self.in_flight = self.in_flight.saturating_sub(1);
        self.phase = if self.in_flight > 0 {
            ExchangePhase::AwaitingReply
        } else {
            ExchangePhase::Idle
        };
        self.refresh_composing();

        ExchangeReport {
            outcome,
            turn,
            retired_placeholders,
            terminal_phase,
            cleared_attachment,
        }
    }

    /// Run a full exchange. Returns `None` if the submit was ignored.
    pub async fn submit(&mut self) -> Option<ExchangeReport> {
        let pending = self.begin_submit()?;
        let transport = self.transport();
        let result = transport.send(&pending.request).await;
        Some(self.resolve(pending, result))
    }

    /// Hand the latest assistant-side text to a narrator.
    pub fn narrate(&self, narrator: &dyn Narrator) -> String {
        narrate_latest(&self.transcript, narrator)
    }

    fn refresh_composing(&mut self) {
        if self.in_flight > 0 {
            return;
        }
        let composing = !self.input.trim().is_empty() || self.staging.is_present();
        self.phase = if composing {
            ExchangePhase::Composing
        } else {
            ExchangePhase::Idle
        };
    }
}

impl std::fmt::Debug for ExchangeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeController")
            .field("conversation_id", &self.conversation_id)
            .field("phase", &self.phase)
            .field("in_flight", &self.in_flight)
            .field("turns", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

fn outcome_name(outcome: &ExchangeOutcome) -> &'static str {
    match outcome {
        ExchangeOutcome::Success(_) => "success",
        ExchangeOutcome::EmptySuccess => "empty_success",
        ExchangeOutcome::BackendError(_) => "backend_error",
        ExchangeOutcome::TransportError(_) => "transport_error",
        ExchangeOutcome::MalformedResponse => "malformed_response",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::SelectedFile;
    use crate::narration::NO_NARRATION_TEXT;
    use crate::render::{EMPTY_REPLY_TEXT, MALFORMED_REPLY_TEXT};
    use crate::transcript::{ContentPart, Role, TurnContent, PLACEHOLDER_TEXT};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays scripted results and records requests.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<RawReply, TransportFailure>>>,
        requests: Mutex<Vec<ExchangeRequest>>,
    }

    impl ScriptedTransport {
        fn with(replies: Vec<Result<RawReply, TransportFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ExchangeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ExchangeRequest) -> Result<RawReply, TransportFailure> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::Network("no scripted reply".into())))
        }
    }

    fn controller(transport: &Arc<ScriptedTransport>) -> ExchangeController {
        ExchangeController::new(transport.clone(), SubmitPolicy::Unguarded)
    }

    fn attachment() -> StagedAttachment {
        StagedAttachment {
            preview_source: "data:image/png;base64,AA==".into(),
            origin: SelectedFile::from_path("dish.png"),
            size_bytes: 1,
        }
    }

    fn recipe(body: &str) -> Result<RawReply, TransportFailure> {
        Ok(RawReply::new(200, body))
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = controller(&transport);

        for input in ["", " ", "\t", "\n\n", "   \r\n  "] {
            ctl.set_input(input);
            assert!(!ctl.can_submit());
            assert!(ctl.submit().await.is_none());
        }

        assert!(ctl.transcript().is_empty());
        assert!(transport.requests().is_empty());
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let transport = ScriptedTransport::with(vec![recipe(
            r#"{"structured_recipe":[{"type":"text","content":"Step 1"},{"type":"text","content":"Step 2"}]}"#,
        )]);
        let mut ctl = controller(&transport);
        ctl.set_input("  carbonara  ");
        assert_eq!(ctl.phase(), ExchangePhase::Composing);

        let report = ctl.submit().await.unwrap();

        assert_eq!(report.retired_placeholders, 1);
        assert_eq!(report.terminal_phase, ExchangePhase::Resolved);
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
        assert_eq!(ctl.input(), "");
        assert_eq!(
            transport.requests(),
            vec![ExchangeRequest {
                message: "carbonara".into(),
                image_present: false
            }]
        );

        let turns = ctl.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, TurnContent::Text("carbonara".into()));
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].id, report.turn);
        assert_eq!(ctl.narrate(&crate::narration::LogNarrator), "Step 1\nStep 2");
    }

    #[tokio::test]
    async fn test_placeholder_lifecycle_across_begin_and_resolve() {
        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = controller(&transport);
        ctl.set_input("soup");

        let pending = ctl.begin_submit().unwrap();
        assert_eq!(ctl.phase(), ExchangePhase::AwaitingReply);
        assert_eq!(ctl.transcript().placeholder_count(), 1);
        let placeholder = ctl.transcript().get(pending.placeholder).unwrap();
        assert_eq!(placeholder.content, TurnContent::Text(PLACEHOLDER_TEXT.into()));
        assert!(pending.user_turn < pending.placeholder);

        let report = ctl.resolve(pending, recipe(r#"{"structured_recipe": []}"#));

        assert_eq!(report.retired_placeholders, 1);
        assert_eq!(ctl.transcript().placeholder_count(), 0);
        let last = ctl.transcript().turns().last().unwrap();
        assert_eq!(last.role, Role::Fallback);
        assert_eq!(last.content, TurnContent::Text(EMPTY_REPLY_TEXT.into()));
    }

    #[tokio::test]
    async fn test_image_only_submit() {
        let transport = ScriptedTransport::with(vec![recipe(
            r#"{"structured_recipe":[{"type":"image","content":"http://x/y.png"}]}"#,
        )]);
        let mut ctl = controller(&transport);
        ctl.install_attachment(attachment());
        assert!(ctl.can_submit());

        let report = ctl.submit().await.unwrap();

        assert!(report.cleared_attachment);
        assert!(!ctl.staging().is_present());
        assert_eq!(
            ctl.transcript().turns()[0].content,
            TurnContent::Text(IMAGE_ONLY_LABEL.into())
        );
        assert_eq!(
            transport.requests()[0],
            ExchangeRequest {
                message: String::new(),
                image_present: true
            }
        );
        assert_eq!(
            report.outcome,
            ExchangeOutcome::Success(vec![ContentPart::image("http://x/y.png", None).unwrap()])
        );
    }

    #[tokio::test]
    async fn test_attachment_cleared_on_every_outcome() {
        let transport = ScriptedTransport::with(vec![
            recipe(r#"{"structured_recipe":[{"type":"text","content":"ok"}]}"#),
            recipe(r#"{"structured_recipe": []}"#),
            Ok(RawReply::new(500, r#"{"error": "AI offline"}"#)),
            Ok(RawReply::new(502, "<html>bad gateway</html>")),
            recipe(r#"{"unexpected": true}"#),
            Err(TransportFailure::Network("connection refused".into())),
        ]);
        let mut ctl = controller(&transport);

        for _ in 0..6 {
            ctl.install_attachment(attachment());
            ctl.set_input("what can I cook with this?");
            let report = ctl.submit().await.unwrap();
            assert!(report.cleared_attachment);
            assert_eq!(report.retired_placeholders, 1);
            assert!(!ctl.staging().is_present());
            assert_eq!(ctl.transcript().placeholder_count(), 0);
        }

        let roles: Vec<Role> = ctl
            .transcript()
            .turns()
            .iter()
            .filter(|t| t.role != Role::User)
            .map(|t| t.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                Role::Assistant,
                Role::Fallback,
                Role::Error,
                Role::Error,
                Role::Error,
                Role::Error
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_outcomes() {
        let transport = ScriptedTransport::with(vec![
            Ok(RawReply::new(429, r#"{"error": "rate limited"}"#)),
            recipe("{}"),
            Err(TransportFailure::Network("connection refused".into())),
        ]);
        let mut ctl = controller(&transport);

        ctl.set_input("a");
        let report = ctl.submit().await.unwrap();
        assert_eq!(report.outcome, ExchangeOutcome::BackendError("rate limited".into()));
        assert_eq!(report.terminal_phase, ExchangePhase::Failed);

        ctl.set_input("b");
        let report = ctl.submit().await.unwrap();
        assert_eq!(report.outcome, ExchangeOutcome::MalformedResponse);
        let turn = ctl.transcript().get(report.turn).unwrap();
        assert_eq!(turn.content, TurnContent::Text(MALFORMED_REPLY_TEXT.into()));

        ctl.set_input("c");
        let report = ctl.submit().await.unwrap();
        assert_eq!(
            report.outcome,
            ExchangeOutcome::TransportError("connection refused".into())
        );
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_overlapping_exchanges_unguarded() {
        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = controller(&transport);

        ctl.set_input("first");
        let first = ctl.begin_submit().unwrap();
        ctl.set_input("second");
        let second = ctl.begin_submit().unwrap();
        assert_eq!(ctl.in_flight(), 2);
        assert_eq!(ctl.transcript().placeholder_count(), 2);

        // The first reply retires every live placeholder.
        let report = ctl.resolve(first, recipe(r#"{"structured_recipe": []}"#));
        assert_eq!(report.retired_placeholders, 2);
        assert_eq!(ctl.phase(), ExchangePhase::AwaitingReply);

        let report = ctl.resolve(second, recipe(r#"{"structured_recipe": []}"#));
        assert_eq!(report.retired_placeholders, 0);
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_reject_while_awaiting_policy() {
        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = ExchangeController::new(transport.clone(), SubmitPolicy::RejectWhileAwaiting);

        ctl.set_input("first");
        let pending = ctl.begin_submit().unwrap();

        ctl.set_input("second");
        assert!(!ctl.can_submit());
        assert!(ctl.begin_submit().is_none());
        assert_eq!(ctl.input(), "second");
        assert_eq!(ctl.transcript().placeholder_count(), 1);

        ctl.resolve(pending, recipe(r#"{"structured_recipe": []}"#));
        assert!(ctl.can_submit());
        assert_eq!(ctl.phase(), ExchangePhase::Composing);
    }

    #[tokio::test]
    async fn test_stage_attachment_rejects_non_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "eggs").unwrap();

        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = controller(&transport);
        assert!(matches!(
            ctl.stage_attachment(&path).await,
            Err(AttachmentError::NotAnImage { .. })
        ));
        assert!(!ctl.staging().is_present());
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_remove_attachment_returns_to_idle() {
        let transport = ScriptedTransport::with(vec![]);
        let mut ctl = controller(&transport);
        ctl.install_attachment(attachment());
        assert_eq!(ctl.phase(), ExchangePhase::Composing);

        assert!(ctl.remove_attachment());
        assert!(!ctl.remove_attachment());
        assert_eq!(ctl.phase(), ExchangePhase::Idle);
        assert_eq!(ctl.narrate(&crate::narration::LogNarrator), NO_NARRATION_TEXT);
    }

    #[test]
    fn test_controllers_are_independent() {
        let transport = ScriptedTransport::with(vec![]);
        let mut a = controller(&transport);
        let b = controller(&transport);
        a.set_input("only in a");
        a.begin_submit();

        assert_ne!(a.conversation_id(), b.conversation_id());
        assert!(b.transcript().is_empty());
    }
}

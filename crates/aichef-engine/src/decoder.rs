//! Reply classification.
//!
//! Every round-trip ends in exactly one [`ExchangeOutcome`]. Classification
//! never fails: HTTP errors, network errors, unparsable bodies and unexpected
//! shapes all map to a variant.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::transcript::ContentPart;
use crate::transport::{RawReply, TransportFailure};

/// Message used when a network failure carries no description.
pub const GENERIC_FAILURE_TEXT: &str = "An error occurred. Please try again.";

/// Terminal classification of one network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ExchangeOutcome {
    /// A reply with at least one element; unrecognized elements already dropped.
    Success(Vec<ContentPart>),
    /// A valid reply whose part list was empty.
    EmptySuccess,
    /// The backend reported an application-level error.
    BackendError(String),
    /// HTTP or network failure.
    TransportError(String),
    /// A success response that had neither `error` nor a part list.
    MalformedResponse,
}

impl ExchangeOutcome {
    /// Whether the exchange counts as failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendError(_) | Self::TransportError(_) | Self::MalformedResponse
        )
    }
}

/// Classify the result of a transport call.
pub fn classify(result: Result<RawReply, TransportFailure>) -> ExchangeOutcome {
    match result {
        Ok(reply) => decode_reply(&reply),
        Err(failure) => {
            let message = failure.to_string();
            warn!(error = %message, "Request failed before a response arrived");
            if message.trim().is_empty() {
                ExchangeOutcome::TransportError(GENERIC_FAILURE_TEXT.into())
            } else {
                ExchangeOutcome::TransportError(message)
            }
        }
    }
}

/// Classify a response that was received.
pub fn decode_reply(reply: &RawReply) -> ExchangeOutcome {
    if !reply.is_success() {
        return decode_failure_status(reply);
    }

    let body: Value = match serde_json::from_str(&reply.body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Success response was not valid JSON");
            return ExchangeOutcome::TransportError(format!("Invalid JSON in response: {e}"));
        }
    };

    if let Some(message) = body.get("error").and_then(truthy_message) {
        warn!(error = %message, "Backend reported an error");
        return ExchangeOutcome::BackendError(message);
    }

    match body.get("structured_recipe") {
        Some(Value::Array(elements)) if elements.is_empty() => {
            warn!("Received empty structured_recipe array");
            ExchangeOutcome::EmptySuccess
        }
        Some(Value::Array(elements)) => {
            debug!(count = elements.len(), "Processing structured reply parts");
            // A non-empty array whose elements are all dropped still counts
            // as a success with zero parts.
            ExchangeOutcome::Success(decode_parts(elements))
        }
        _ => {
            warn!(body = %reply.body, "Unexpected response structure");
            ExchangeOutcome::MalformedResponse
        }
    }
}

fn decode_failure_status(reply: &RawReply) -> ExchangeOutcome {
    let backend_message = serde_json::from_str::<Value>(&reply.body)
        .ok()
        .and_then(|body| body.get("error").and_then(truthy_message));

    if let Some(message) = backend_message {
        warn!(status = reply.status, error = %message, "Backend returned an error status");
        ExchangeOutcome::BackendError(message)
    } else {
        warn!(status = reply.status, "Error status without usable error details");
        ExchangeOutcome::TransportError(format!(
            "Server error ({}) - Could not parse error details. Status text: {}",
            reply.status, reply.reason
        ))
    }
}

/// Map reply elements to parts, dropping unrecognized or incomplete ones.
fn decode_parts(elements: &[Value]) -> Vec<ContentPart> {
    elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let part = decode_part(element);
            if part.is_none() {
                debug!(index, element = %element, "Dropping unrecognized reply part");
            }
            part
        })
        .collect()
}

fn decode_part(element: &Value) -> Option<ContentPart> {
    let content = element.get("content")?.as_str()?;
    match element.get("type")?.as_str()? {
        "text" => ContentPart::text(content),
        "image" => {
            let mime_type = element
                .get("mime_type")
                .and_then(Value::as_str)
                .map(str::to_string);
            ContentPart::image(content, mime_type)
        }
        _ => None,
    }
}

/// Turn an `error` field into a message if it is truthy.
///
/// `null`, `false`, `0` and `""` are treated as absent. Non-string truthy
/// values are reported using their JSON text.
fn truthy_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

//! Turning raw frame text into a [`Message`].

use serde_json::Value;

use super::{ErrorResponse, Message, MessageType, Request, SuccessResponse, wire::InboundFrame};
use crate::{config::TypeDetection, trace::TraceId};

/// Reasons an inbound frame could not be classified.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The frame is not a JSON object of the expected shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The `Type` field names neither direction.
    #[error("unknown message type: {kind}")]
    UnknownType { trace_id: TraceId, kind: String },
    /// No direction could be determined.
    #[error("unknown message type: <missing>")]
    MissingType { trace_id: TraceId },
    /// A field required for the frame's direction is absent.
    #[error("{kind} frame missing {field}")]
    MissingField {
        trace_id: TraceId,
        kind: MessageType,
        field: &'static str,
    },
}

impl ParseError {
    /// Trace identifier recovered from the frame, if it got that far.
    #[must_use]
    pub fn trace_id(&self) -> Option<&TraceId> {
        match self {
            Self::Json(_) => None,
            Self::UnknownType { trace_id, .. }
            | Self::MissingType { trace_id }
            | Self::MissingField { trace_id, .. } => Some(trace_id),
        }
    }
}

/// Classify one frame of text.
///
/// A missing or empty `TraceId` is replaced with a generated one. Request
/// frames without `Params` receive an empty object. Response frames with a
/// non-empty `Error` are failures; otherwise they succeed with `Result`,
/// which defaults to `null`.
///
/// # Errors
///
/// Returns [`ParseError`] when the text is not valid JSON, when its direction
/// cannot be determined, or when `Id` (and `Method` for requests) is absent.
pub fn classify(text: &str, detection: TypeDetection) -> Result<Message, ParseError> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    let trace_id = TraceId::from_wire(frame.trace_id.as_deref());

    let kind = match frame.kind.as_deref() {
        Some(raw) => MessageType::from_wire(raw).ok_or_else(|| ParseError::UnknownType {
            trace_id: trace_id.clone(),
            kind: raw.to_owned(),
        })?,
        None => sniff(text, detection).ok_or_else(|| ParseError::MissingType {
            trace_id: trace_id.clone(),
        })?,
    };

    let missing = |field| ParseError::MissingField {
        trace_id: trace_id.clone(),
        kind,
        field,
    };
    let id = frame.id.ok_or_else(|| missing("Id"))?;

    match kind {
        MessageType::Request => {
            let method = frame.method.ok_or_else(|| missing("Method"))?;
            let params = match frame.params {
                None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
                Some(params) => params,
            };
            Ok(Message::Request(Request {
                trace_id,
                id,
                method,
                params,
            }))
        }
        MessageType::Response => {
            let method = frame.method.unwrap_or_default();
            match frame.error {
                Some(error) if !error.is_empty() => Ok(Message::Failure(ErrorResponse {
                    trace_id,
                    id,
                    method,
                    error,
                })),
                _ => Ok(Message::Success(SuccessResponse {
                    trace_id,
                    id,
                    method,
                    result: frame.result.unwrap_or(Value::Null),
                })),
            }
        }
    }
}

fn sniff(text: &str, detection: TypeDetection) -> Option<MessageType> {
    if detection != TypeDetection::Lenient {
        return None;
    }
    if text.contains("\"response\"") {
        Some(MessageType::Response)
    } else if text.contains("\"request\"") {
        Some(MessageType::Request)
    } else {
        None
    }
}

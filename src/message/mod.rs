//! Messages exchanged over the bridge.
//!
//! Every frame on the wire is one JSON object. Inbound text is turned into
//! the [`Message`] sum type by [`classify`]; outbound messages are rendered
//! back to text with [`Message::encode`].
//!
//! ```
//! use serde_json::json;
//! use wirebridge::{
//!     config::TypeDetection,
//!     message::{Message, classify},
//! };
//!
//! let frame = r#"{"TraceId":"t1","Id":"r1","Method":"ping","Type":"request","Params":{}}"#;
//! let Message::Request(request) = classify(frame, TypeDetection::Strict).unwrap() else {
//!     panic!("expected a request");
//! };
//! assert_eq!(request.method, "ping");
//! assert_eq!(request.params, json!({}));
//! ```

mod classify;
mod wire;

use std::fmt;

pub use classify::{ParseError, classify};
use serde_json::Value;
pub(crate) use wire::LogFrame;
use wire::{ErrorFrame, RequestFrame, SuccessFrame};

use crate::trace::TraceId;

/// Direction marker carried in the `Type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Work the receiver must perform and answer.
    Request,
    /// Answer to a request issued earlier by the receiver.
    Response,
}

impl MessageType {
    /// Value written to the `Type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }

    /// Parse a `Type` field value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "request" => Some(Self::Request),
            "response" => Some(Self::Response),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A call issued by one side that the other side must answer exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub trace_id: TraceId,
    pub id: String,
    pub method: String,
    /// Method parameters; an empty object when the frame carried none.
    pub params: Value,
}

/// Successful answer carrying the handler's result.
#[derive(Clone, Debug, PartialEq)]
pub struct SuccessResponse {
    pub trace_id: TraceId,
    pub id: String,
    pub method: String,
    pub result: Value,
}

/// Failed answer carrying a description of the failure.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub trace_id: TraceId,
    pub id: String,
    pub method: String,
    pub error: String,
}

/// One frame, classified.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Request(Request),
    Success(SuccessResponse),
    Failure(ErrorResponse),
}

impl Message {
    /// Build the success answer to `request`.
    #[must_use]
    pub fn success_for(request: &Request, result: Value) -> Self {
        Self::Success(SuccessResponse {
            trace_id: request.trace_id.clone(),
            id: request.id.clone(),
            method: request.method.clone(),
            result,
        })
    }

    /// Build the error answer to `request`.
    #[must_use]
    pub fn failure_for(request: &Request, error: impl Into<String>) -> Self {
        Self::Failure(ErrorResponse {
            trace_id: request.trace_id.clone(),
            id: request.id.clone(),
            method: request.method.clone(),
            error: error.into(),
        })
    }

    /// Direction of this message.
    #[must_use]
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Request(_) => MessageType::Request,
            Self::Success(_) | Self::Failure(_) => MessageType::Response,
        }
    }

    #[must_use]
    pub fn trace_id(&self) -> &TraceId {
        match self {
            Self::Request(m) => &m.trace_id,
            Self::Success(m) => &m.trace_id,
            Self::Failure(m) => &m.trace_id,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Request(m) => &m.id,
            Self::Success(m) => &m.id,
            Self::Failure(m) => &m.id,
        }
    }

    /// Render the message as one wire frame.
    ///
    /// Fields are written in the order `TraceId`, `Id`, `Method`, `Type`
    /// followed by `Params`, `Result` or `Error`.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload cannot be serialised.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Request(m) => serde_json::to_string(&RequestFrame {
                trace_id: m.trace_id.as_str(),
                id: &m.id,
                method: &m.method,
                kind: MessageType::Request.as_str(),
                params: &m.params,
            }),
            Self::Success(m) => serde_json::to_string(&SuccessFrame {
                trace_id: m.trace_id.as_str(),
                id: &m.id,
                method: &m.method,
                kind: MessageType::Response.as_str(),
                result: &m.result,
            }),
            Self::Failure(m) => serde_json::to_string(&ErrorFrame {
                trace_id: m.trace_id.as_str(),
                id: &m.id,
                method: &m.method,
                kind: MessageType::Response.as_str(),
                error: &m.error,
            }),
        }
    }
}

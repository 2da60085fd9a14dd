//! Serde views of frames as they appear on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loose view of an inbound frame.
///
/// Every field is optional so that classification can report precisely what
/// is missing. Unknown fields are ignored and key order does not matter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct InboundFrame {
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct RequestFrame<'a> {
    pub trace_id: &'a str,
    pub id: &'a str,
    pub method: &'a str,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub params: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct SuccessFrame<'a> {
    pub trace_id: &'a str,
    pub id: &'a str,
    pub method: &'a str,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub result: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ErrorFrame<'a> {
    pub trace_id: &'a str,
    pub id: &'a str,
    pub method: &'a str,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub error: &'a str,
}

/// Log line mirrored to the host over the bound connection.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LogFrame<'a> {
    pub trace_id: &'a str,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub level: &'a str,
    pub message: &'a str,
}

impl LogFrame<'_> {
    /// Value of the `Type` field for log frames.
    pub(crate) const KIND: &'static str = "log";
}

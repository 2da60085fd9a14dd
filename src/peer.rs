//! Outbound calls to the connected host.
//!
//! A [`Peer`] issues requests over whichever connection is currently bound
//! and awaits the matching response through the pending-call registry.

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
    connection::ConnectionSlot,
    message::{Message, Request},
    pending::{DuplicateIdError, PendingCall, PendingCalls},
    trace::TraceContext,
};

/// Why an outbound call produced no result.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CallError {
    /// No connection is bound.
    #[error("not connected")]
    NotConnected,
    /// The call identifier is already pending.
    #[error(transparent)]
    DuplicateId(#[from] DuplicateIdError),
    /// The connection closed before the request could be written.
    #[error("connection closed")]
    Closed,
    /// The remote side answered with an error.
    #[error("remote error: {0}")]
    Remote(String),
    /// The call was withdrawn before any response arrived.
    #[error("call canceled")]
    Canceled,
    /// No response arrived in time.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// Parameters could not be serialised.
    #[error("failed to encode params: {0}")]
    Encode(#[source] serde_json::Error),
    /// The result could not be decoded into the requested type.
    #[error("failed to decode result: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Handle for issuing calls to the remote side.
///
/// Cloning is cheap; every clone shares the same registry and binding.
#[derive(Clone, Debug)]
pub struct Peer {
    pending: PendingCalls,
    slot: ConnectionSlot,
    default_timeout: Option<Duration>,
}

impl Peer {
    #[must_use]
    pub fn new(pending: PendingCalls, slot: ConnectionSlot, default_timeout: Option<Duration>) -> Self {
        Self {
            pending,
            slot,
            default_timeout,
        }
    }

    /// Whether a connection is currently bound.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.slot.is_bound() }

    /// Registry tracking this peer's calls.
    #[must_use]
    pub fn pending(&self) -> &PendingCalls { &self.pending }

    /// Call `method` on the remote side and await its result.
    ///
    /// Applies the bridge's default call timeout, if one is configured.
    ///
    /// # Errors
    ///
    /// See [`CallError`].
    pub async fn call(
        &self,
        trace: &TraceContext,
        method: &str,
        params: Value,
    ) -> Result<Value, CallError> {
        let call = self.issue(trace, Uuid::new_v4().to_string(), method, params).await?;
        match self.default_timeout {
            Some(limit) => await_with_timeout(call, limit).await,
            None => call.await,
        }
    }

    /// Like [`Peer::call`] with an explicit timeout. On expiry the pending
    /// entry is removed and a late response is ignored.
    ///
    /// # Errors
    ///
    /// See [`CallError`].
    pub async fn call_with_timeout(
        &self,
        trace: &TraceContext,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        let call = self.issue(trace, Uuid::new_v4().to_string(), method, params).await?;
        await_with_timeout(call, timeout).await
    }

    /// Call with typed parameters and result.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Peer::call`], returns [`CallError::Encode`]
    /// or [`CallError::Decode`] when (de)serialisation fails.
    pub async fn call_typed<P, R>(
        &self,
        trace: &TraceContext,
        method: &str,
        params: &P,
    ) -> Result<R, CallError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(CallError::Encode)?;
        let value = self.call(trace, method, params).await?;
        serde_json::from_value(value).map_err(CallError::Decode)
    }

    /// Register `id`, then write the request frame.
    ///
    /// The entry exists before the frame leaves, so a fast response always
    /// finds it. If the write fails the entry is withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::NotConnected`], [`CallError::DuplicateId`],
    /// [`CallError::Encode`] or [`CallError::Closed`].
    pub async fn issue(
        &self,
        trace: &TraceContext,
        id: String,
        method: &str,
        params: Value,
    ) -> Result<PendingCall, CallError> {
        let conn = self.slot.current().ok_or(CallError::NotConnected)?;
        let request = Message::Request(Request {
            trace_id: trace.trace_id().clone(),
            id,
            method: method.to_owned(),
            params,
        });
        let frame = request.encode().map_err(CallError::Encode)?;
        let call = self.pending.register(request.id())?;
        debug!(
            "issuing call: trace_id={}, id={}, method={method}",
            trace.trace_id(),
            call.id()
        );
        // Dropping `call` on failure withdraws the entry.
        conn.send(frame).await.map_err(|_| CallError::Closed)?;
        Ok(call)
    }
}

async fn await_with_timeout(call: PendingCall, limit: Duration) -> Result<Value, CallError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(CallError::Timeout(limit)))
}

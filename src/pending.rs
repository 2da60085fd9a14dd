//! Registry of outbound calls awaiting a response.
//!
//! Each outbound request registers its identifier before the frame is sent.
//! The entry is removed either when a matching response arrives or when the
//! caller stops waiting: dropping an unsettled [`PendingCall`] removes its
//! own entry so the registry never accumulates abandoned calls.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll},
};

use dashmap::{DashMap, mapref::entry::Entry};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::peer::CallError;

type Outcome = Result<Value, String>;
type Map = DashMap<String, oneshot::Sender<Outcome>>;

/// Error returned when an identifier is already awaiting a response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("duplicate call id: {id}")]
pub struct DuplicateIdError {
    pub id: String,
}

/// What happened to a resolution attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Resolution {
    /// The waiting caller received the outcome.
    Delivered,
    /// No call with this identifier was pending.
    Unknown,
    /// The entry existed but its caller had already stopped waiting.
    Abandoned,
}

/// Concurrent map from call identifier to the waiting caller.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Debug, Default)]
pub struct PendingCalls {
    inner: Arc<Map>,
}

impl PendingCalls {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `id` and return the future that completes with its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateIdError`] if `id` is already pending.
    pub fn register(&self, id: impl Into<String>) -> Result<PendingCall, DuplicateIdError> {
        let id = id.into();
        let (tx, rx) = oneshot::channel();
        match self.inner.entry(id.clone()) {
            Entry::Occupied(_) => return Err(DuplicateIdError { id }),
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }
        crate::metrics::set_pending(self.inner.len());
        Ok(PendingCall {
            id,
            rx,
            registry: Arc::downgrade(&self.inner),
            settled: false,
        })
    }

    /// Complete the call `id` with a result.
    pub fn resolve_success(&self, id: &str, result: Value) -> Resolution {
        self.resolve(id, Ok(result))
    }

    /// Complete the call `id` with a remote error description.
    pub fn resolve_error(&self, id: &str, error: impl Into<String>) -> Resolution {
        self.resolve(id, Err(error.into()))
    }

    fn resolve(&self, id: &str, outcome: Outcome) -> Resolution {
        let Some((_, tx)) = self.inner.remove(id) else {
            crate::metrics::inc_errors(crate::metrics::ErrorKind::UnknownId);
            return Resolution::Unknown;
        };
        crate::metrics::set_pending(self.inner.len());
        if tx.send(outcome).is_ok() {
            Resolution::Delivered
        } else {
            Resolution::Abandoned
        }
    }

    /// Remove `id` without completing it. The waiter observes
    /// [`CallError::Canceled`].
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.inner.remove(id).is_some();
        if removed {
            crate::metrics::set_pending(self.inner.len());
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool { self.inner.contains_key(id) }

    #[must_use]
    pub fn len(&self) -> usize { self.inner.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    /// Identifiers currently awaiting a response, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

/// Future resolving to the outcome of one outbound call.
///
/// Dropping it before completion withdraws the call from the registry.
#[derive(Debug)]
#[must_use = "dropping a PendingCall withdraws the call"]
pub struct PendingCall {
    id: String,
    rx: oneshot::Receiver<Outcome>,
    registry: Weak<Map>,
    settled: bool,
}

impl PendingCall {
    /// Identifier this call is registered under.
    #[must_use]
    pub fn id(&self) -> &str { &self.id }
}

impl Future for PendingCall {
    type Output = Result<Value, CallError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        self.settled = true;
        Poll::Ready(match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(CallError::Remote(message)),
            Err(_) => Err(CallError::Canceled),
        })
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.rx.close();
        if let Some(map) = self.registry.upgrade() {
            // Only remove our own sender; a later call may reuse the id.
            if map.remove_if(&self.id, |_, tx| tx.is_closed()).is_some() {
                crate::metrics::set_pending(map.len());
            }
        }
    }
}

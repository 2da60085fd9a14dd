//! The single outbound binding shared by the whole bridge.
//!
//! At most one connection is bound at any time. Outbound calls and forwarded
//! log lines go to whichever connection currently holds the slot.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use super::{ConnectionHandle, ConnectionId};
use crate::config::ConnectionPolicy;

/// A connection was refused because another one is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("connection rejected: {current} is already bound")]
pub struct AlreadyConnected {
    pub current: ConnectionId,
}

/// Shared holder of the currently bound connection.
#[derive(Clone, Debug, Default)]
pub struct ConnectionSlot(Arc<Mutex<Option<ConnectionHandle>>>);

impl ConnectionSlot {
    /// Bind `handle` according to `policy`.
    ///
    /// Under [`ConnectionPolicy::Replace`] the previous binding, if any, is
    /// returned. Its connection keeps running but is no longer used for
    /// outbound traffic.
    ///
    /// # Errors
    ///
    /// Under [`ConnectionPolicy::Reject`] returns [`AlreadyConnected`] while a
    /// live connection holds the slot.
    pub fn bind(
        &self,
        handle: ConnectionHandle,
        policy: ConnectionPolicy,
    ) -> Result<Option<ConnectionHandle>, AlreadyConnected> {
        let mut guard = self.0.lock();
        if policy == ConnectionPolicy::Reject {
            if let Some(current) = guard.as_ref().filter(|h| !h.is_closed()) {
                return Err(AlreadyConnected {
                    current: current.id(),
                });
            }
        }
        let previous = guard.replace(handle);
        drop(guard);
        if let Some(previous) = &previous {
            info!("connection replaced: previous={}", previous.id());
        }
        Ok(previous)
    }

    /// Clear the slot if it still holds `id`. Returns whether it did.
    pub fn unbind_if(&self, id: ConnectionId) -> bool {
        let mut guard = self.0.lock();
        if guard.as_ref().is_some_and(|h| h.id() == id) {
            *guard = None;
            true
        } else {
            false
        }
    }

    /// The currently bound connection.
    #[must_use]
    pub fn current(&self) -> Option<ConnectionHandle> { self.0.lock().clone() }

    #[must_use]
    pub fn is_bound(&self) -> bool { self.0.lock().is_some() }
}

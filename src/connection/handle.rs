//! Outbound handle for one live connection.

use std::fmt;

use tokio::sync::mpsc;

/// Identifier assigned to a connection when it is served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "ConnectionId({})", self.0) }
}

/// Failure to queue a frame for writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The connection's writer has stopped.
    #[error("connection closed")]
    Closed,
    /// The outbound queue is at capacity.
    #[error("outbound queue full")]
    Full,
}

/// Cloneable sender feeding the writer task of one connection.
///
/// Frames queued through one handle are written in the order they were
/// queued. The handle stays valid after the connection ends; sends then fail
/// with [`SendError::Closed`].
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(id: ConnectionId, tx: mpsc::Sender<String>) -> Self { Self { id, tx } }

    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Queue `frame`, waiting for capacity if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] once the writer has stopped.
    pub async fn send(&self, frame: String) -> Result<(), SendError> {
        self.tx.send(frame).await.map_err(|_| SendError::Closed)
    }

    /// Queue `frame` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Full`] when the queue is at capacity and
    /// [`SendError::Closed`] once the writer has stopped.
    pub fn try_send(&self, frame: String) -> Result<(), SendError> {
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Whether the writer has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }
}

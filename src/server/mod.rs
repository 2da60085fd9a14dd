//! Tokio-based WebSocket server for a [`Bridge`].
//!
//! `BridgeServer` accepts TCP connections, upgrades each one to a WebSocket
//! and hands it to the bridge. The server carries a typestate `S` indicating
//! whether it is [`Unbound`] or [`Bound`]; only bound servers can run.

use std::sync::Arc;

use tokio::{net::TcpListener, sync::oneshot};

use crate::Bridge;

/// WebSocket server driving one [`Bridge`].
///
/// ```no_run
/// use std::net::SocketAddr;
///
/// use wirebridge::{Bridge, server::BridgeServer};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), wirebridge::server::ServerError> {
/// let addr: SocketAddr = "127.0.0.1:34987".parse().expect("valid address");
/// BridgeServer::new(Bridge::builder().build())
///     .bind(addr)?
///     .run()
///     .await
/// # }
/// ```
pub struct BridgeServer<S = Unbound>
where
    S: ServerState,
{
    pub(crate) bridge: Bridge,
    /// Notified once the accept loop is running. Single use; supply a new
    /// sender for every run.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) backoff_config: BackoffConfig,
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

impl BridgeServer<Unbound> {
    /// Create a server for `bridge`. Call [`bind`](Self::bind) before running.
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            ready_tx: None,
            backoff_config: BackoffConfig::default(),
            state: Unbound,
        }
    }
}

impl<S: ServerState> BridgeServer<S> {
    /// Register a channel notified once the server starts accepting.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Configure the accept-error back-off. Values are normalised.
    #[must_use]
    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff_config = config.normalized();
        self
    }

    /// The bridge served by this server.
    #[must_use]
    pub fn bridge(&self) -> &Bridge { &self.bridge }
}

mod binding;
mod connection;
pub mod error;
mod runtime;

pub use error::ServerError;
/// Re-exported configuration types for server backoff behavior.
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;

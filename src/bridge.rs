//! The bridge instance and its builder.
//!
//! A [`Bridge`] owns the method table, the pending-call registry and the
//! outbound binding. It is cheap to clone and every clone refers to the same
//! instance, so tests and embedders can create as many independent bridges
//! as they need.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use crate::{
    config::BridgeConfig,
    connection::{self, CloseReason, ConnectionError, ConnectionId, ConnectionSlot, Endpoint},
    dispatch::Dispatcher,
    handler::{Handler, HandlerRegistry, RegistryError},
    logging::{ForwardingSink, LogSink, TracingSink},
    peer::{CallError, Peer},
    pending::PendingCalls,
    trace::TraceContext,
};

/// Configures the methods and options of a [`Bridge`].
///
/// Registration methods return [`Result<Self, RegistryError>`] so they can be
/// chained with `?`.
///
/// ```
/// use serde_json::{Value, json};
/// use wirebridge::{
///     Bridge,
///     handler::{HandlerContext, HandlerError, handler_fn},
/// };
///
/// # fn build() -> Result<Bridge, wirebridge::handler::RegistryError> {
/// let bridge = Bridge::builder()
///     .method(
///         "ping",
///         handler_fn(|_ctx: HandlerContext, _p: Value| async {
///             Ok::<_, HandlerError>(json!("pong"))
///         }),
///     )?
///     .build();
/// assert_eq!(bridge.methods(), vec!["ping"]);
/// # Ok(bridge)
/// # }
/// # build().unwrap();
/// ```
#[derive(Default)]
pub struct BridgeBuilder {
    handlers: HandlerRegistry,
    config: BridgeConfig,
    log: Option<Arc<dyn LogSink>>,
}

impl BridgeBuilder {
    /// Register `handler` for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the name is empty or already registered.
    pub fn method<H: Handler>(
        mut self,
        method: impl Into<String>,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.handlers.register(method, handler)?;
        Ok(self)
    }

    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the local log sink. Defaults to [`TracingSink`].
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log = Some(sink);
        self
    }

    #[must_use]
    pub fn build(self) -> Bridge {
        let pending = PendingCalls::new();
        let slot = ConnectionSlot::default();
        let local = self.log.unwrap_or_else(|| Arc::new(TracingSink));
        let log: Arc<dyn LogSink> = if self.config.forward_logs {
            Arc::new(ForwardingSink::new(local, slot.clone()).with_threshold(self.config.forward_level))
        } else {
            local
        };
        let peer = Peer::new(pending.clone(), slot.clone(), self.config.call_timeout);
        let dispatcher = Dispatcher::new(
            Arc::new(self.handlers),
            pending,
            Arc::clone(&log),
            self.config.type_detection,
        );
        Bridge {
            inner: Arc::new(Inner {
                endpoint: Endpoint {
                    dispatcher,
                    slot,
                    peer,
                    policy: self.config.connection_policy,
                    outbound_capacity: self.config.outbound_capacity.max(1),
                },
                log,
                config: self.config,
                next_connection: AtomicU64::new(1),
            }),
        }
    }
}

struct Inner {
    endpoint: Endpoint,
    log: Arc<dyn LogSink>,
    config: BridgeConfig,
    next_connection: AtomicU64,
}

/// One bridge instance.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    #[must_use]
    pub fn builder() -> BridgeBuilder { BridgeBuilder::default() }

    /// Handle for outbound calls over the bound connection.
    #[must_use]
    pub fn peer(&self) -> Peer { self.inner.endpoint.peer.clone() }

    /// Call `method` on the connected host. Shorthand for
    /// [`Peer::call`].
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
        self.inner.endpoint.peer.call(trace, method, params).await
    }

    /// Whether a connection is currently bound.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.inner.endpoint.slot.is_bound() }

    /// Registry of outbound calls awaiting a response.
    #[must_use]
    pub fn pending_calls(&self) -> &PendingCalls { self.inner.endpoint.peer.pending() }

    /// Registered method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> { self.inner.endpoint.dispatcher.methods() }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig { &self.inner.config }

    /// Sink receiving the bridge's trace-tagged log lines.
    #[must_use]
    pub fn log_sink(&self) -> Arc<dyn LogSink> { Arc::clone(&self.inner.log) }

    /// Serve `ws` until the peer closes it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] on transport failure or when the
    /// connection is refused by the connection policy.
    pub async fn serve_connection<S>(
        &self,
        ws: WebSocketStream<S>,
    ) -> Result<CloseReason, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        self.serve_connection_until(ws, CancellationToken::new())
            .await
    }

    /// Serve `ws` until the peer closes it or `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// See [`Bridge::serve_connection`].
    pub async fn serve_connection_until<S>(
        &self,
        ws: WebSocketStream<S>,
        shutdown: CancellationToken,
    ) -> Result<CloseReason, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = ConnectionId::new(self.inner.next_connection.fetch_add(1, Ordering::Relaxed));
        connection::serve(ws, id, &self.inner.endpoint, shutdown).await
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("methods", &self.methods())
            .field("connected", &self.is_connected())
            .field("pending_calls", &self.pending_calls().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

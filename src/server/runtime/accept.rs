//! Accept loop for the server runtime.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::sleep,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::warn;

use super::backoff::BackoffConfig;
use crate::{
    Bridge,
    metrics::{self, ErrorKind},
    server::{ServerError, connection::spawn_connection_task},
};

/// Abstraction for sources of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

#[derive(Debug)]
pub(in crate::server) struct AcceptLoopOptions {
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
    pub backoff: BackoffConfig,
}

/// Accept connections from `listener` until `shutdown` is cancelled.
///
/// Each accepted stream is served on a task tracked by `tracker`. Accept
/// failures back off exponentially from `initial_delay` up to `max_delay`;
/// a success resets the delay.
pub(in crate::server) async fn accept_loop<L>(
    listener: Arc<L>,
    bridge: Bridge,
    options: AcceptLoopOptions,
) where
    L: AcceptListener + 'static,
{
    let AcceptLoopOptions {
        shutdown,
        tracker,
        backoff,
    } = options;
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    loop {
        let accepted = select! {
            biased;
            () = shutdown.cancelled() => break,
            res = listener.accept() => res,
        };
        match accepted {
            Ok((stream, peer_addr)) => {
                spawn_connection_task(stream, peer_addr, bridge.clone(), &shutdown, &tracker);
                delay = backoff.initial_delay;
            }
            Err(e) => {
                metrics::inc_errors(ErrorKind::Transport);
                let local_addr = listener.local_addr().ok();
                warn!("{}: local_addr={local_addr:?}", ServerError::Accept(e));
                select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    () = sleep(delay) => {}
                }
                delay = backoff.next_delay(delay);
            }
        }
    }
}

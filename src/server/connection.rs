//! Connection task spawning for [`BridgeServer`](super::BridgeServer).

use std::{net::SocketAddr, panic::AssertUnwindSafe};

use futures::FutureExt;
use tokio::net::TcpStream;
use tokio_tungstenite::accept_async;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{error, warn};

use crate::{
    Bridge,
    connection::ConnectionError,
    metrics::{self, ErrorKind},
    panic::format_panic,
};

/// Spawn a task upgrading `stream` to a WebSocket and serving it, logging and
/// discarding any panics.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    peer_addr: SocketAddr,
    bridge: Bridge,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) {
    let shutdown = shutdown.clone();
    tracker.spawn(async move {
        let fut = AssertUnwindSafe(serve_stream(stream, peer_addr, bridge, shutdown)).catch_unwind();
        if let Err(panic) = fut.await {
            let panic_msg = format_panic(panic);
            error!(panic = %panic_msg, ?peer_addr, "connection task panicked");
        }
    });
}

async fn serve_stream(
    stream: TcpStream,
    peer_addr: SocketAddr,
    bridge: Bridge,
    shutdown: CancellationToken,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("failed to set TCP_NODELAY: peer_addr={peer_addr}, error={e}");
    }
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            metrics::inc_errors(ErrorKind::Transport);
            warn!("websocket handshake failed: peer_addr={peer_addr}, error={e}");
            return;
        }
    };
    match bridge.serve_connection_until(ws, shutdown).await {
        Ok(_) | Err(ConnectionError::Rejected(_)) => {}
        Err(e) => warn!("connection task error: peer_addr={peer_addr}, error={e}"),
    }
}

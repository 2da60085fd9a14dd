//! Lifecycle of one WebSocket connection.
//!
//! Serving a connection binds it as the bridge's outbound target, then runs
//! two halves concurrently: a writer task draining the connection's outbound
//! queue into the socket, and the receive loop feeding each inbound frame to
//! the dispatcher while driving the requests it has accepted. The loop ends on
//! peer close, transport error or shutdown. Teardown cancels handlers still
//! running and releases the binding only if this connection still holds it.

mod counter;
mod handle;
mod slot;

pub use counter::live_connection_count;
use counter::LiveConnection;
use futures::{
    SinkExt,
    StreamExt,
    stream::{SplitSink, SplitStream},
};
pub use handle::{ConnectionHandle, ConnectionId, SendError};
pub use slot::{AlreadyConnected, ConnectionSlot};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{
        self,
        Message,
        Utf8Bytes,
        error::ProtocolError,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ConnectionPolicy,
    dispatch::{Dispatcher, InFlight},
    metrics::{self, Direction, ErrorKind},
    peer::Peer,
};

/// Why a connection stopped being served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a close frame.
    PeerClosed,
    /// The stream ended without a closing handshake.
    StreamEnded,
    /// The bridge was asked to stop serving.
    Shutdown,
}

/// Errors that end a connection abnormally.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Reading from the socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),
    /// The connection was refused under [`ConnectionPolicy::Reject`].
    #[error(transparent)]
    Rejected(#[from] AlreadyConnected),
}

/// Shared pieces every served connection needs.
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) slot: ConnectionSlot,
    pub(crate) peer: Peer,
    pub(crate) policy: ConnectionPolicy,
    pub(crate) outbound_capacity: usize,
}

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

/// Serve `ws` until it closes or `shutdown` is cancelled.
pub(crate) async fn serve<S>(
    ws: WebSocketStream<S>,
    id: ConnectionId,
    endpoint: &Endpoint,
    shutdown: CancellationToken,
) -> Result<CloseReason, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, stream) = ws.split();
    let (tx, rx) = mpsc::channel(endpoint.outbound_capacity);
    let handle = ConnectionHandle::new(id, tx);

    if let Err(err) = endpoint.slot.bind(handle.clone(), endpoint.policy) {
        warn!("{err}: rejected={id}");
        reject(&mut sink).await;
        return Err(err.into());
    }

    let _live = LiveConnection::new();
    info!(
        "connection opened: id={id}, live_connections={}",
        live_connection_count()
    );

    let writer_stop = CancellationToken::new();
    let writer = tokio::spawn(write_frames(sink, rx, writer_stop.clone(), id));
    let mut in_flight = InFlight::new();

    let result = receive_frames(stream, &handle, endpoint, &mut in_flight, &shutdown).await;

    let unbound = endpoint.slot.unbind_if(id);
    if !in_flight.is_empty() {
        debug!("canceling unfinished requests: id={id}, count={}", in_flight.len());
    }
    drop(in_flight);
    writer_stop.cancel();
    if let Err(err) = writer.await {
        warn!("connection writer task failed: id={id}, error={err}");
    }

    match &result {
        Ok(reason) => info!("connection closed: id={id}, reason={reason:?}, unbound={unbound}"),
        Err(err) => {
            metrics::inc_errors(ErrorKind::Transport);
            warn!("connection failed: id={id}, error={err}, unbound={unbound}");
        }
    }
    result
}

async fn receive_frames<S>(
    mut stream: SplitStream<WebSocketStream<S>>,
    handle: &ConnectionHandle,
    endpoint: &Endpoint,
    in_flight: &mut InFlight,
    shutdown: &CancellationToken,
) -> Result<CloseReason, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        // Requests queued by the previous frame are polled before the next
        // frame is read, so handlers start in receive order.
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Ok(CloseReason::Shutdown),
            Some(()) = in_flight.join_next(), if !in_flight.is_empty() => continue,
            next = stream.next() => next,
        };
        let message = match next {
            None => return Ok(CloseReason::StreamEnded),
            Some(Ok(message)) => message,
            Some(Err(tungstenite::Error::ConnectionClosed)) => return Ok(CloseReason::PeerClosed),
            Some(Err(tungstenite::Error::Protocol(
                ProtocolError::ResetWithoutClosingHandshake,
            ))) => return Ok(CloseReason::StreamEnded),
            Some(Err(err)) => return Err(err.into()),
        };
        match message {
            Message::Text(text) => {
                metrics::inc_frames(Direction::Inbound);
                endpoint
                    .dispatcher
                    .handle_frame(text.as_str(), handle, &endpoint.peer, in_flight);
            }
            Message::Binary(bytes) => {
                metrics::inc_frames(Direction::Inbound);
                match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        endpoint
                            .dispatcher
                            .handle_frame(text, handle, &endpoint.peer, in_flight);
                    }
                    Err(_) => warn!(
                        "ignoring non-UTF-8 binary frame: id={}, len={}",
                        handle.id(),
                        bytes.len()
                    ),
                }
            }
            Message::Close(frame) => {
                debug!("close frame received: id={}, frame={frame:?}", handle.id());
                return Ok(CloseReason::PeerClosed);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

async fn write_frames<S>(
    mut sink: WsSink<S>,
    mut rx: mpsc::Receiver<String>,
    stop: CancellationToken,
    id: ConnectionId,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let frame = tokio::select! {
            biased;
            () = stop.cancelled() => break,
            frame = rx.recv() => frame,
        };
        let Some(text) = frame else { break };
        if let Err(err) = sink.send(Message::text(text)).await {
            metrics::inc_errors(ErrorKind::Transport);
            warn!("failed to write frame: id={id}, error={err}");
            break;
        }
        metrics::inc_frames(Direction::Outbound);
    }
    rx.close();
    if let Err(err) = sink.close().await {
        debug!("error closing socket: id={id}, error={err}");
    }
}

async fn reject<S>(sink: &mut WsSink<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Policy,
        reason: Utf8Bytes::from_static("another connection is active"),
    };
    if let Err(err) = sink.send(Message::Close(Some(frame))).await {
        debug!("failed to send rejection close frame: {err}");
    }
}

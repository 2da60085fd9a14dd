//! Running a bridge against scripted frames.

use std::time::Duration;

use serde_json::Value;
use tokio::{task::JoinHandle, time::timeout};
use wirebridge::{Bridge, CloseReason, connection::ConnectionError};

use crate::{TestPeer, WsPair};

/// Quiet period after which [`drive_with_frames`] stops collecting replies.
const IDLE: Duration = Duration::from_millis(200);

/// Serve a fresh in-memory connection on `bridge`.
///
/// Returns the remote side and the task serving the bridge side.
pub async fn serve(bridge: &Bridge) -> (TestPeer, JoinHandle<Result<CloseReason, ConnectionError>>) {
    let WsPair { server, client } = WsPair::new().await;
    let bridge = bridge.clone();
    let task = tokio::spawn(async move { bridge.serve_connection(server).await });
    (client, task)
}

/// Send `frames` over a new connection and collect every frame the bridge
/// writes back until it has been quiet for a short while.
///
/// # Panics
///
/// Panics if the connection cannot be driven.
pub async fn drive_with_frames<I>(bridge: &Bridge, frames: I) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    let (mut peer, task) = serve(bridge).await;
    for frame in frames {
        peer.send_json(&frame).await;
    }
    let mut replies = Vec::new();
    loop {
        let next = timeout(IDLE, peer.try_recv_json()).await;
        match next {
            Ok(Some(frame)) => replies.push(frame),
            Ok(None) | Err(_) => break,
        }
    }
    peer.close().await;
    let _ = timeout(Duration::from_secs(1), task).await;
    replies
}

//! In-memory WebSocket pairs and the scripted remote host.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{io::DuplexStream, time::timeout};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{Message, protocol::Role},
};

/// How long [`TestPeer::recv_json`] waits for a frame.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(2);

const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Both ends of an in-memory WebSocket connection.
pub struct WsPair {
    /// End handed to the bridge.
    pub server: WebSocketStream<DuplexStream>,
    /// End driven by the test.
    pub client: TestPeer,
}

impl WsPair {
    /// Create a connected pair over a `tokio::io::duplex` stream. No HTTP
    /// handshake takes place.
    pub async fn new() -> Self {
        let (server_io, client_io) = tokio::io::duplex(DUPLEX_CAPACITY);
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        Self {
            server,
            client: TestPeer::new(client),
        }
    }
}

/// Scripted remote side of a bridge connection.
pub struct TestPeer {
    ws: WebSocketStream<DuplexStream>,
    recv_timeout: Duration,
}

impl std::fmt::Debug for TestPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestPeer")
            .field("recv_timeout", &self.recv_timeout)
            .finish_non_exhaustive()
    }
}

impl TestPeer {
    pub fn new(ws: WebSocketStream<DuplexStream>) -> Self {
        Self {
            ws,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    /// Change how long receives wait before failing.
    #[must_use]
    pub fn with_recv_timeout(mut self, limit: Duration) -> Self {
        self.recv_timeout = limit;
        self
    }

    /// Send `frame` as a text message.
    ///
    /// # Panics
    ///
    /// Panics if the connection is closed.
    pub async fn send_json(&mut self, frame: &Value) { self.send_text(&frame.to_string()).await; }

    /// Send raw text, which need not be valid JSON.
    ///
    /// # Panics
    ///
    /// Panics if the connection is closed.
    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::text(text.to_owned()))
            .await
            .expect("send frame to bridge");
    }

    /// Send raw bytes as a binary message.
    ///
    /// # Panics
    ///
    /// Panics if the connection is closed.
    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.ws
            .send(Message::binary(bytes))
            .await
            .expect("send binary frame to bridge");
    }

    /// Next text frame from the bridge, or `None` once the connection closed.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within the receive timeout or a frame is not
    /// valid JSON.
    pub async fn try_recv_json(&mut self) -> Option<Value> {
        loop {
            let next = timeout(self.recv_timeout, self.ws.next())
                .await
                .expect("timed out waiting for a frame from the bridge");
            match next {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return None,
                Some(Ok(Message::Text(text))) => {
                    return Some(serde_json::from_str(text.as_str()).expect("bridge sent invalid JSON"));
                }
                Some(Ok(_)) => {}
            }
        }
    }

    /// Next text frame from the bridge.
    ///
    /// # Panics
    ///
    /// Panics on timeout or if the connection closed.
    pub async fn recv_json(&mut self) -> Value {
        self.try_recv_json()
            .await
            .expect("connection closed while waiting for a frame")
    }

    /// Next frame whose `Type` is not `log`.
    ///
    /// # Panics
    ///
    /// Panics on timeout or if the connection closed.
    pub async fn recv_message(&mut self) -> Value {
        loop {
            let frame = self.recv_json().await;
            if frame["Type"] != "log" {
                return frame;
            }
        }
    }

    /// Assert that nothing arrives for `window`.
    ///
    /// # Panics
    ///
    /// Panics if a frame arrives.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(message))) = timeout(window, self.ws.next()).await {
            panic!("expected silence, received {message:?}");
        }
    }

    /// Wait for the bridge to close the connection, returning the close
    /// frame's code if one was sent.
    ///
    /// # Panics
    ///
    /// Panics if a data frame arrives first or on timeout.
    pub async fn expect_close(&mut self) -> Option<u16> {
        let next = timeout(self.recv_timeout, self.ws.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => frame.map(|f| u16::from(f.code)),
            None | Some(Err(_)) => None,
            Some(Ok(other)) => panic!("expected close, received {other:?}"),
        }
    }

    /// Start the closing handshake.
    pub async fn close(&mut self) { let _ = self.ws.close(None).await; }
}

#![doc(html_root_url = "https://docs.rs/wirebridge/latest")]
//! Public API for the `wirebridge` library.
//!
//! A bridge multiplexes JSON-RPC traffic in both directions over a single
//! WebSocket connection: the remote host calls methods registered on the
//! bridge, and handlers (or any other code holding a [`Peer`]) call methods
//! on the host. Every frame carries a trace identifier that follows the
//! request through handlers and logs.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod panic;
pub mod peer;
pub mod pending;
pub mod server;
pub mod trace;

pub use bridge::{Bridge, BridgeBuilder};
pub use config::{BridgeConfig, ConnectionPolicy, TypeDetection};
pub use connection::CloseReason;
pub use error::{BridgeError, Result};
pub use handler::{
    Handler,
    HandlerContext,
    HandlerError,
    MethodNotFoundError,
    handler_fn,
    typed_handler_fn,
};
pub use message::Message;
pub use peer::{CallError, Peer};
pub use pending::{DuplicateIdError, PendingCalls};
pub use server::BridgeServer;
pub use trace::{TraceContext, TraceId};

//! Canonical error and result types for the crate.
//!
//! Each concern has its own error type; [`BridgeError`] gathers them for
//! callers that want a single surface.

use thiserror::Error;

use crate::{
    connection::ConnectionError,
    handler::RegistryError,
    message::ParseError,
    peer::CallError,
    server::ServerError,
};

/// Top-level error type exposed by `wirebridge`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// Building the method table failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// An inbound frame could not be classified.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An outbound call produced no result.
    #[error(transparent)]
    Call(#[from] CallError),
    /// A connection ended abnormally.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// The listener could not be bound or stopped accepting.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Canonical result alias used by `wirebridge` public APIs.
pub type Result<T> = std::result::Result<T, BridgeError>;

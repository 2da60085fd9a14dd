//! Metric helpers for `wirebridge`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking active connections.
pub const CONNECTIONS_ACTIVE: &str = "wirebridge_connections_active";
/// Name of the counter tracking frames read or written.
pub const FRAMES_TOTAL: &str = "wirebridge_frames_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "wirebridge_errors_total";
/// Name of the gauge tracking outbound calls awaiting a response.
pub const PENDING_CALLS: &str = "wirebridge_pending_calls";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames read from the peer.
    Inbound,
    /// Frames written to the peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Category recorded in the `kind` label of [`ERRORS_TOTAL`].
#[derive(Clone, Copy, Debug)]
pub enum ErrorKind {
    /// Inbound frame could not be classified.
    Parse,
    /// A request handler failed or panicked.
    Handler,
    /// Reading from or writing to the socket failed.
    Transport,
    /// A response named a call that was not pending.
    UnknownId,
}

impl ErrorKind {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Handler => "handler",
            ErrorKind::Transport => "transport",
            ErrorKind::UnknownId => "unknown_id",
        }
    }
}

/// Increment the active connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the active connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence.
pub fn inc_errors(kind: ErrorKind) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Publish the number of outbound calls awaiting a response.
#[allow(clippy::cast_precision_loss)]
pub fn set_pending(count: usize) {
    #[cfg(feature = "metrics")]
    gauge!(PENDING_CALLS).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

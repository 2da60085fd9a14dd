//! Trace-aware log sinks.
//!
//! Every log line produced while handling a frame carries the frame's trace
//! identifier. [`TracingSink`] records lines through `tracing`;
//! [`ForwardingSink`] additionally mirrors them to the bound host as `log`
//! frames so the host can merge them into its own log stream.

use std::{fmt, sync::Arc};

use tracing::Level;

use crate::{connection::ConnectionSlot, message::LogFrame, trace::TraceId};

/// Emit an event at a dynamically selected level.
macro_rules! dynamic_event {
    ($level:expr, $($rest:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($rest)*),
            Level::WARN  => tracing::warn!($($rest)*),
            Level::INFO  => tracing::info!($($rest)*),
            Level::DEBUG => tracing::debug!($($rest)*),
            Level::TRACE => tracing::trace!($($rest)*),
        }
    };
}

/// Destination for log lines tagged with a trace identifier.
pub trait LogSink: Send + Sync + 'static {
    /// Record `message` at `level` for the frame identified by `trace_id`.
    fn log(&self, level: Level, trace_id: &TraceId, message: &str);

    fn debug(&self, trace_id: &TraceId, message: &str) { self.log(Level::DEBUG, trace_id, message); }

    fn info(&self, trace_id: &TraceId, message: &str) { self.log(Level::INFO, trace_id, message); }

    fn warn(&self, trace_id: &TraceId, message: &str) { self.log(Level::WARN, trace_id, message); }

    fn error(&self, trace_id: &TraceId, message: &str) { self.log(Level::ERROR, trace_id, message); }
}

/// Sink writing through the global `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    #[expect(
        clippy::cognitive_complexity,
        reason = "complexity from dynamic_event! macro expansion"
    )]
    fn log(&self, level: Level, trace_id: &TraceId, message: &str) {
        dynamic_event!(level, trace_id = %trace_id, "{message} trace_id={trace_id}");
    }
}

/// Least severe level [`ForwardingSink`] mirrors unless told otherwise.
pub const DEFAULT_FORWARD_LEVEL: Level = Level::INFO;

/// Sink that logs locally and mirrors lines at or above a threshold to the
/// bound connection.
///
/// Forwarding never blocks: when no connection is bound or its outbound queue
/// is full the line is only logged locally.
pub struct ForwardingSink {
    local: Arc<dyn LogSink>,
    slot: ConnectionSlot,
    threshold: Level,
}

impl ForwardingSink {
    /// Forward lines at [`DEFAULT_FORWARD_LEVEL`] and above.
    #[must_use]
    pub fn new(local: Arc<dyn LogSink>, slot: ConnectionSlot) -> Self {
        Self {
            local,
            slot,
            threshold: DEFAULT_FORWARD_LEVEL,
        }
    }

    /// Forward lines at `threshold` and above.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    // `tracing` orders levels by verbosity: ERROR is the smallest.
    fn forwards(&self, level: Level) -> bool { level <= self.threshold }
}

impl fmt::Debug for ForwardingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingSink")
            .field("bound", &self.slot.is_bound())
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl LogSink for ForwardingSink {
    fn log(&self, level: Level, trace_id: &TraceId, message: &str) {
        self.local.log(level, trace_id, message);
        if !self.forwards(level) {
            return;
        }
        let Some(conn) = self.slot.current() else {
            return;
        };
        let level = level.as_str().to_ascii_lowercase();
        let frame = LogFrame {
            trace_id: trace_id.as_str(),
            kind: LogFrame::KIND,
            level: &level,
            message,
        };
        if let Ok(text) = serde_json::to_string(&frame) {
            // Dropped silently; reporting would recurse into this sink.
            let _ = conn.try_send(text);
        }
    }
}

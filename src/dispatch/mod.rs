//! Routing of inbound frames.
//!
//! Responses settle entries in the pending-call registry. Requests become
//! invocations queued on the connection's [`InFlight`] set, which the receive
//! loop polls alongside the socket: each handler starts in receive order, and
//! a handler awaiting a nested call never stalls the loop. Frames that cannot
//! be classified are logged and dropped; the connection stays open.

mod invoke;

use std::{fmt, sync::Arc};

use futures::{
    FutureExt,
    StreamExt,
    future::BoxFuture,
    stream::FuturesUnordered,
};
use tracing::Instrument;

use crate::{
    config::TypeDetection,
    connection::ConnectionHandle,
    handler::HandlerRegistry,
    logging::LogSink,
    message::{Message, classify},
    metrics::{self, ErrorKind},
    peer::Peer,
    pending::{PendingCalls, Resolution},
    trace::{TraceContext, TraceId},
};

/// What the dispatcher did with one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame could not be classified.
    Dropped,
    /// A response settled its pending call.
    Resolved,
    /// A response named no pending call.
    UnknownCall,
    /// A request was handed to its handler.
    Dispatched,
}

/// Request invocations owned by one connection.
///
/// Invocations are first polled in the order they were queued. Dropping the
/// set cancels whatever is still running, which also withdraws any outbound
/// calls those handlers were awaiting.
#[derive(Default)]
pub struct InFlight {
    requests: FuturesUnordered<BoxFuture<'static, ()>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of invocations that have not finished.
    #[must_use]
    pub fn len(&self) -> usize { self.requests.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.requests.is_empty() }

    /// Drive the invocations until one finishes. Resolves to `None` when the
    /// set is empty.
    pub async fn join_next(&mut self) -> Option<()> { self.requests.next().await }

    fn push(&mut self, invocation: BoxFuture<'static, ()>) { self.requests.push(invocation); }
}

impl fmt::Debug for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("len", &self.len())
            .finish()
    }
}

/// Classifies inbound frames and routes them.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    pending: PendingCalls,
    log: Arc<dyn LogSink>,
    detection: TypeDetection,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        handlers: Arc<HandlerRegistry>,
        pending: PendingCalls,
        log: Arc<dyn LogSink>,
        detection: TypeDetection,
    ) -> Self {
        Self {
            handlers,
            pending,
            log,
            detection,
        }
    }

    /// Registered method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> { self.handlers.methods() }

    /// Handle one frame received on `conn`.
    ///
    /// Requests are queued on `in_flight` and run when it is next polled;
    /// their single response is written back to `conn`, never to whichever
    /// connection is bound at the time.
    pub fn handle_frame(
        &self,
        text: &str,
        conn: &ConnectionHandle,
        peer: &Peer,
        in_flight: &mut InFlight,
    ) -> FrameOutcome {
        let message = match classify(text, self.detection) {
            Ok(message) => message,
            Err(err) => {
                let trace_id = err.trace_id().cloned().unwrap_or_else(TraceId::generate);
                metrics::inc_errors(ErrorKind::Parse);
                self.log
                    .warn(&trace_id, &format!("dropping inbound frame: {err}"));
                return FrameOutcome::Dropped;
            }
        };

        match message {
            Message::Request(request) => {
                let trace = TraceContext::new(request.trace_id.clone());
                let span = trace.span();
                self.log.debug(
                    trace.trace_id(),
                    &format!("request received: id={}, method={}", request.id, request.method),
                );
                in_flight.push(
                    invoke::invoke(
                        Arc::clone(&self.handlers),
                        Arc::clone(&self.log),
                        request,
                        trace,
                        peer.clone(),
                        conn.clone(),
                    )
                    .instrument(span)
                    .boxed(),
                );
                FrameOutcome::Dispatched
            }
            Message::Success(ok) => {
                let resolution = self.pending.resolve_success(&ok.id, ok.result);
                self.settled(&ok.trace_id, &ok.id, resolution)
            }
            Message::Failure(failure) => {
                let resolution = self.pending.resolve_error(&failure.id, failure.error);
                self.settled(&failure.trace_id, &failure.id, resolution)
            }
        }
    }

    fn settled(&self, trace_id: &TraceId, id: &str, resolution: Resolution) -> FrameOutcome {
        match resolution {
            Resolution::Delivered => FrameOutcome::Resolved,
            Resolution::Abandoned => {
                self.log
                    .debug(trace_id, &format!("caller stopped waiting: id={id}"));
                FrameOutcome::Resolved
            }
            Resolution::Unknown => {
                self.log
                    .warn(trace_id, &format!("response for unknown call id: id={id}"));
                FrameOutcome::UnknownCall
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers)
            .field("pending", &self.pending.len())
            .field("detection", &self.detection)
            .finish_non_exhaustive()
    }
}

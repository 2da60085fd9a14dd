//! Running one request through its handler.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use serde_json::Value;

use crate::{
    connection::ConnectionHandle,
    handler::{HandlerContext, HandlerRegistry},
    logging::LogSink,
    message::{Message, Request},
    metrics::{self, ErrorKind},
    panic::handler_panic_error,
    peer::Peer,
    trace::TraceContext,
};

/// Serve `request` and write exactly one response to `conn`.
///
/// Lookup failures, handler errors and handler panics all become error
/// responses.
pub(super) async fn invoke(
    handlers: Arc<HandlerRegistry>,
    log: Arc<dyn LogSink>,
    mut request: Request,
    trace: TraceContext,
    peer: Peer,
    conn: ConnectionHandle,
) {
    let params = std::mem::take(&mut request.params);
    let response = match run(&handlers, &request.method, trace.clone(), peer, params).await {
        Ok(result) => Message::success_for(&request, result),
        Err(error) => {
            metrics::inc_errors(ErrorKind::Handler);
            log.error(trace.trace_id(), &format!("handle request failed: {error}"));
            Message::failure_for(&request, error)
        }
    };

    let frame = match response.encode() {
        Ok(frame) => frame,
        Err(err) => {
            let error = format!("failed to encode result: {err}");
            log.error(trace.trace_id(), &error);
            match Message::failure_for(&request, error).encode() {
                Ok(frame) => frame,
                Err(_) => return,
            }
        }
    };

    if let Err(err) = conn.send(frame).await {
        log.warn(
            trace.trace_id(),
            &format!("response not delivered: id={}, error={err}", request.id),
        );
    }
}

async fn run(
    handlers: &HandlerRegistry,
    method: &str,
    trace: TraceContext,
    peer: Peer,
    params: Value,
) -> Result<Value, String> {
    let handler = handlers.lookup(method).map_err(|err| err.to_string())?;
    let ctx = HandlerContext { trace, peer };
    match AssertUnwindSafe(handler.call(ctx, params)).catch_unwind().await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(err.to_string()),
        Err(panic) => Err(handler_panic_error(panic)),
    }
}

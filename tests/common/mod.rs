//! Shared utilities for integration tests.
//!
//! Provides a bridge fixture exposing a small set of methods that exercise
//! success, failure, panics, typed parameters and nested outbound calls.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::time::Duration;

use rstest::fixture;
use serde::Deserialize;
use serde_json::{Value, json};
use wirebridge::{
    Bridge,
    BridgeConfig,
    HandlerContext,
    HandlerError,
    handler_fn,
    typed_handler_fn,
};

#[derive(Deserialize)]
struct AddParams {
    a: i64,
    b: i64,
}

/// Build a bridge with the standard test methods and `config`.
pub fn bridge_with(config: BridgeConfig) -> Bridge {
    Bridge::builder()
        .config(config)
        .method(
            "ping",
            handler_fn(|_: HandlerContext, _: Value| async { Ok::<_, HandlerError>(json!("pong")) }),
        )
        .and_then(|b| {
            b.method(
                "echo",
                handler_fn(|_: HandlerContext, params: Value| async move {
                    Ok::<_, HandlerError>(params)
                }),
            )
        })
        .and_then(|b| {
            b.method(
                "fail",
                handler_fn(|_: HandlerContext, _: Value| async {
                    Err::<Value, _>(HandlerError::new("deliberate failure"))
                }),
            )
        })
        .and_then(|b| {
            b.method(
                "explode",
                handler_fn(|_: HandlerContext, _: Value| async {
                    if true {
                        panic!("kaboom");
                    }
                    Ok::<_, HandlerError>(Value::Null)
                }),
            )
        })
        .and_then(|b| {
            b.method(
                "add",
                typed_handler_fn(|_: HandlerContext, p: AddParams| async move {
                    Ok::<_, HandlerError>(p.a + p.b)
                }),
            )
        })
        .and_then(|b| {
            b.method(
                "sleep",
                handler_fn(|_: HandlerContext, params: Value| async move {
                    let ms = params["ms"].as_u64().unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok::<_, HandlerError>(json!(ms))
                }),
            )
        })
        .and_then(|b| {
            b.method(
                "whoami",
                handler_fn(|ctx: HandlerContext, _: Value| async move {
                    let user = ctx
                        .peer
                        .call(&ctx.trace, "getUser", json!({"id": 7}))
                        .await?;
                    Ok::<_, HandlerError>(json!({"user": user}))
                }),
            )
        })
        .expect("register test methods")
        .build()
}

#[fixture]
pub fn bridge() -> Bridge { bridge_with(BridgeConfig::default()) }

/// A request frame as the host would send it.
pub fn request(trace_id: &str, id: &str, method: &str, params: Value) -> Value {
    json!({
        "TraceId": trace_id,
        "Id": id,
        "Method": method,
        "Type": "request",
        "Params": params,
    })
}

/// Serve a connection on `bridge` and wait until it is bound.
///
/// # Panics
///
/// Panics if the connection is not bound within a second.
pub async fn connect(
    bridge: &Bridge,
) -> (
    wirebridge_testing::TestPeer,
    tokio::task::JoinHandle<Result<wirebridge::CloseReason, wirebridge::connection::ConnectionError>>,
) {
    let served = wirebridge_testing::serve(bridge).await;
    wait_until(|| bridge.is_connected()).await;
    served
}

/// Poll `condition` every few milliseconds for up to a second.
///
/// # Panics
///
/// Panics if `condition` never holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within a second");
}

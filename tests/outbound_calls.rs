//! Calls issued by the bridge to the connected host.

mod common;

use std::time::Duration;

use common::{bridge, connect, request, wait_until};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wirebridge::{Bridge, CallError, TraceContext, TraceId};

#[rstest]
#[tokio::test]
async fn response_resolves_call_and_clears_registry(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    let trace = TraceContext::new(TraceId::from("t1"));
    let call = bridge
        .peer()
        .issue(&trace, "c1".into(), "getAnswer", json!({}))
        .await
        .expect("issue");

    let sent = host.recv_json().await;
    assert_eq!(
        sent,
        json!({"TraceId": "t1", "Id": "c1", "Method": "getAnswer", "Type": "request", "Params": {}})
    );
    assert!(bridge.pending_calls().contains("c1"));

    host.send_json(&json!({"TraceId": "t1", "Id": "c1", "Type": "response", "Result": 42}))
        .await;
    assert_eq!(call.await.expect("result"), json!(42));
    assert!(bridge.pending_calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn remote_error_is_returned(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    let peer = bridge.peer();
    let pending = tokio::spawn(async move {
        peer.call(&TraceContext::generate(), "getUser", json!({"id": 1}))
            .await
    });

    let sent = host.recv_json().await;
    host.send_json(&json!({
        "TraceId": sent["TraceId"],
        "Id": sent["Id"],
        "Type": "response",
        "Error": "no such user",
    }))
    .await;

    let err = pending.await.expect("join").expect_err("remote error");
    assert!(matches!(err, CallError::Remote(ref msg) if msg == "no such user"));
}

#[rstest]
#[tokio::test]
async fn call_without_connection_fails_immediately(bridge: Bridge) {
    let err = bridge
        .call(&TraceContext::generate(), "getUser", json!({}))
        .await
        .expect_err("not connected");
    assert!(matches!(err, CallError::NotConnected));
    assert!(bridge.pending_calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn timed_out_call_leaves_no_entry_and_ignores_late_response(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    let err = bridge
        .peer()
        .call_with_timeout(
            &TraceContext::generate(),
            "slow",
            json!({}),
            Duration::from_millis(50),
        )
        .await
        .expect_err("timeout");
    assert!(matches!(err, CallError::Timeout(_)));
    assert!(bridge.pending_calls().is_empty());

    let sent = host.recv_json().await;
    host.send_json(&json!({"TraceId": sent["TraceId"], "Id": sent["Id"], "Type": "response", "Result": 1}))
        .await;
    host.send_json(&request("t2", "r2", "ping", json!({}))).await;
    assert_eq!(host.recv_json().await["Result"], "pong");
    assert!(bridge.pending_calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn duplicate_response_is_ignored(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    let call = bridge
        .peer()
        .issue(&TraceContext::generate(), "c9".into(), "m", json!({}))
        .await
        .expect("issue");
    let _ = host.recv_json().await;

    let reply = json!({"TraceId": "t", "Id": "c9", "Type": "response", "Result": "first"});
    host.send_json(&reply).await;
    assert_eq!(call.await.expect("result"), "first");

    host.send_json(&json!({"TraceId": "t", "Id": "c9", "Type": "response", "Result": "second"}))
        .await;
    host.send_json(&request("t", "r1", "ping", json!({}))).await;
    assert_eq!(host.recv_json().await["Id"], "r1");
    assert!(bridge.pending_calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn duplicate_call_id_is_rejected(bridge: Bridge) {
    let (_host, _task) = connect(&bridge).await;
    let trace = TraceContext::generate();
    let peer = bridge.peer();
    let _first = peer
        .issue(&trace, "same".into(), "m", json!({}))
        .await
        .expect("first issue");
    let err = peer
        .issue(&trace, "same".into(), "m", json!({}))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, CallError::DuplicateId(_)));
    assert_eq!(bridge.pending_calls().len(), 1);
}

#[rstest]
#[tokio::test]
async fn dropping_a_call_withdraws_it(bridge: Bridge) {
    let (_host, _task) = connect(&bridge).await;
    let call = bridge
        .peer()
        .issue(&TraceContext::generate(), "gone".into(), "m", json!({}))
        .await
        .expect("issue");
    assert!(bridge.pending_calls().contains("gone"));
    drop(call);
    assert!(!bridge.pending_calls().contains("gone"));
}

#[derive(Serialize)]
struct UserQuery {
    id: u32,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    name: String,
}

#[rstest]
#[tokio::test]
async fn typed_calls_round_trip_through_serde(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    let peer = bridge.peer();
    let pending = tokio::spawn(async move {
        peer.call_typed::<_, User>(&TraceContext::generate(), "getUser", &UserQuery { id: 7 })
            .await
    });

    let sent = host.recv_json().await;
    assert_eq!(sent["Params"], json!({"id": 7}));
    host.send_json(&json!({"TraceId": sent["TraceId"], "Id": sent["Id"], "Type": "response", "Result": {"name": "ada"}}))
        .await;
    let user = pending.await.expect("join").expect("typed result");
    assert_eq!(user, User { name: "ada".into() });
}

#[rstest]
#[tokio::test]
async fn handler_can_call_back_into_the_host(bridge: Bridge) {
    let (mut host, _task) = connect(&bridge).await;
    host.send_json(&request("nested", "r1", "whoami", json!({}))).await;

    let call = host.recv_json().await;
    assert_eq!(call["Type"], "request");
    assert_eq!(call["Method"], "getUser");
    assert_eq!(call["TraceId"], "nested");
    assert_eq!(call["Params"], json!({"id": 7}));
    host.send_json(&json!({"TraceId": "nested", "Id": call["Id"], "Type": "response", "Result": "ada"}))
        .await;

    let reply = host.recv_json().await;
    assert_eq!(
        reply,
        json!({"TraceId": "nested", "Id": "r1", "Method": "whoami", "Type": "response", "Result": {"user": "ada"}})
    );
    wait_until(|| bridge.pending_calls().is_empty()).await;
}

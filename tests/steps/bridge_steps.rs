//! Steps for request dispatch and outbound call scenarios.
use cucumber::{given, then, when};
use serde_json::Value;
use wirebridge::CallError;

use crate::world::BridgeWorld;

#[given("a bridge with a connected host")]
async fn given_connected(world: &mut BridgeWorld) { world.connect().await; }

#[when(expr = "the host sends request {string} for method {string} with trace {string}")]
async fn when_host_requests(world: &mut BridgeWorld, id: String, method: String, trace: String) {
    world.host_requests(&trace, &id, &method).await;
}

#[when(expr = "the bridge calls {string} on the host")]
fn when_bridge_calls(world: &mut BridgeWorld, method: String) { world.bridge_calls(&method); }

#[then(expr = "the host receives a request for {string} with trace {string}")]
async fn then_host_receives_request(world: &mut BridgeWorld, method: String, trace: String) {
    let frame = world.receive().await;
    assert_eq!(frame["Type"], "request");
    assert_eq!(frame["Method"], method.as_str());
    assert_eq!(frame["TraceId"], trace.as_str());
}

#[then(expr = "the host receives a request for {string}")]
async fn then_host_receives_any_request(world: &mut BridgeWorld, method: String) {
    let frame = world.receive().await;
    assert_eq!(frame["Type"], "request");
    assert_eq!(frame["Method"], method.as_str());
}

#[when(expr = "the host answers with result {string}")]
async fn when_host_answers(world: &mut BridgeWorld, result: String) {
    world.host_answers("Result", Value::String(result)).await;
}

#[when(expr = "the host answers with error {string}")]
async fn when_host_fails(world: &mut BridgeWorld, error: String) {
    world.host_answers("Error", Value::String(error)).await;
}

#[then(expr = "the host receives response {string} with result {string}")]
async fn then_response_result(world: &mut BridgeWorld, id: String, result: String) {
    let frame = world.receive().await;
    assert_eq!(frame["Type"], "response");
    assert_eq!(frame["Id"], id.as_str());
    assert_eq!(frame["Result"], result.as_str());
}

#[then(expr = "the host receives response {string} with error {string}")]
async fn then_response_error(world: &mut BridgeWorld, id: String, error: String) {
    let frame = world.receive().await;
    assert_eq!(frame["Type"], "response");
    assert_eq!(frame["Id"], id.as_str());
    assert_eq!(frame["Error"], error.as_str());
}

#[then(expr = "the call returns {string}")]
async fn then_call_returns(world: &mut BridgeWorld, expected: String) {
    world.finish_call().await;
    let value = world.outcome().as_ref().expect("call succeeded");
    assert_eq!(value, &Value::String(expected));
}

#[then(expr = "the call fails with remote error {string}")]
async fn then_call_fails(world: &mut BridgeWorld, expected: String) {
    world.finish_call().await;
    match world.outcome() {
        Err(CallError::Remote(msg)) => assert_eq!(msg, &expected),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[then(expr = "{int} calls are pending")]
fn then_pending(world: &mut BridgeWorld, count: usize) { assert_eq!(world.pending_count(), count); }

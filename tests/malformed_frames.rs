//! Frames that cannot be classified are logged and dropped without
//! disturbing the connection.

mod common;

use std::time::Duration;

use common::{bridge, bridge_with, request};
use rstest::rstest;
use serde_json::json;
use wirebridge::{Bridge, BridgeConfig, TypeDetection};
use wirebridge_testing::{LoggerHandle, logger, serve};

#[rstest]
#[case::truncated_json(r#"{"Type":"#)]
#[case::not_an_object("[1, 2, 3]")]
#[case::unknown_type(r#"{"TraceId":"t","Id":"x","Type":"notify"}"#)]
#[case::missing_type(r#"{"TraceId":"t","Id":"x","Method":"ping"}"#)]
#[case::request_without_method(r#"{"TraceId":"t","Id":"x","Type":"request"}"#)]
#[case::request_without_id(r#"{"TraceId":"t","Method":"ping","Type":"request"}"#)]
#[case::response_without_id(r#"{"TraceId":"t","Type":"response","Result":1}"#)]
#[tokio::test]
async fn malformed_frame_is_dropped_and_connection_survives(
    bridge: Bridge,
    mut logger: LoggerHandle,
    #[case] frame: &str,
) {
    let (mut peer, _task) = serve(&bridge).await;
    peer.send_text(frame).await;
    peer.send_json(&request("t1", "r1", "ping", json!({}))).await;

    let reply = peer.recv_json().await;
    assert_eq!(reply["Id"], "r1");
    assert_eq!(reply["Result"], "pong");
    peer.expect_silence(Duration::from_millis(50)).await;
    assert!(logger.contains("dropping inbound frame"));
}

#[rstest]
#[tokio::test]
async fn unknown_type_is_reported_with_its_trace(bridge: Bridge, mut logger: LoggerHandle) {
    let (mut peer, _task) = serve(&bridge).await;
    peer.send_text(r#"{"TraceId":"odd-1","Id":"x","Type":"log"}"#)
        .await;
    peer.send_json(&request("t1", "r1", "ping", json!({}))).await;
    let _ = peer.recv_json().await;

    let messages = logger.drain_messages();
    let line = messages
        .iter()
        .find(|m| m.contains("unknown message type: log"))
        .unwrap_or_else(|| panic!("no unknown-type warning in {messages:?}"));
    assert!(line.contains("odd-1"), "{line}");
}

#[rstest]
#[tokio::test]
async fn response_for_unknown_call_is_logged(bridge: Bridge, mut logger: LoggerHandle) {
    let (mut peer, _task) = serve(&bridge).await;
    peer.send_text(r#"{"TraceId":"t","Id":"nobody","Type":"response","Result":1}"#)
        .await;
    peer.send_json(&request("t1", "r1", "ping", json!({}))).await;
    let _ = peer.recv_json().await;
    assert!(logger.contains("response for unknown call id: id=nobody"));
}

#[tokio::test]
async fn lenient_detection_accepts_frames_without_type() {
    let bridge = bridge_with(BridgeConfig::default().with_type_detection(TypeDetection::Lenient));
    let (mut peer, _task) = serve(&bridge).await;
    peer.send_text(r#"{"TraceId":"t1","Id":"r1","Method":"ping","Kind":"request"}"#)
        .await;
    let reply = peer.recv_json().await;
    assert_eq!(reply["Result"], "pong");
}

//! Utilities for driving a [`Bridge`](wirebridge::Bridge) over in-memory
//! WebSocket connections during tests.
//!
//! The remote side of each connection is a [`TestPeer`], a scripted host that
//! sends JSON frames and reads the bridge's replies with a timeout.
//!
//! ```rust
//! use serde_json::json;
//! use wirebridge::Bridge;
//! use wirebridge_testing::drive_with_frames;
//!
//! # async fn example(bridge: Bridge) {
//! let replies = drive_with_frames(
//!     &bridge,
//!     [json!({"TraceId": "t1", "Id": "r1", "Method": "ping", "Type": "request"})],
//! )
//! .await;
//! # }
//! ```

mod drive;
pub mod logging;
mod peer;

pub use drive::{drive_with_frames, serve};
pub use logging::{LoggerHandle, logger};
pub use peer::{DEFAULT_RECV_TIMEOUT, TestPeer, WsPair};

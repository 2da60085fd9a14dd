//! Test helpers shared across server modules.

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};

use rstest::fixture;
use serde_json::{Value, json};

use super::{Bound, BridgeServer};
use crate::{
    Bridge,
    handler::{HandlerContext, HandlerError, handler_fn},
};

#[fixture]
pub fn bridge() -> Bridge {
    Bridge::builder()
        .method(
            "ping",
            handler_fn(|_: HandlerContext, _: Value| async { Ok::<_, HandlerError>(json!("pong")) }),
        )
        .expect("register ping")
        .build()
}

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents race conditions where another
/// process could claim the port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

pub fn bind_server(bridge: Bridge, listener: StdTcpListener) -> BridgeServer<Bound> {
    BridgeServer::new(bridge)
        .bind_existing_listener(listener)
        .expect("Failed to bind")
}

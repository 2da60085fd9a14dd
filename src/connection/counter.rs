//! Live connection counting.

use std::sync::atomic::{AtomicU64, Ordering};

static LIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

/// Guard counting one served connection for as long as it lives.
pub(super) struct LiveConnection;

impl LiveConnection {
    pub(super) fn new() -> Self {
        LIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
        crate::metrics::inc_connections();
        Self
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        LIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
        crate::metrics::dec_connections();
    }
}

/// Number of connections currently being served by this process.
#[must_use]
pub fn live_connection_count() -> u64 { LIVE_CONNECTIONS.load(Ordering::Relaxed) }

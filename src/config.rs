//! Bridge configuration.
//!
//! [`BridgeConfig`] collects the knobs that change how frames are classified,
//! how concurrent connections are treated and how outbound calls behave.

use std::time::Duration;

use tracing::Level;

use crate::logging::DEFAULT_FORWARD_LEVEL;

/// Default capacity of the per-connection outbound frame queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

/// How a frame's direction is determined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypeDetection {
    /// Only the `Type` field classifies a frame.
    #[default]
    Strict,
    /// When `Type` is absent, look for the quoted `"response"` and then
    /// `"request"` tokens in the raw frame text. Older peers rely on this.
    Lenient,
}

/// What happens when a connection arrives while another one is bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// The newest connection takes over the outbound binding.
    #[default]
    Replace,
    /// The newcomer is closed with a policy-violation close frame.
    Reject,
}

/// Runtime options for a [`Bridge`](crate::Bridge).
///
/// ```
/// use std::time::Duration;
///
/// use wirebridge::config::{BridgeConfig, ConnectionPolicy};
///
/// let config = BridgeConfig::default()
///     .with_connection_policy(ConnectionPolicy::Reject)
///     .with_call_timeout(Some(Duration::from_secs(10)));
/// assert_eq!(config.connection_policy, ConnectionPolicy::Reject);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Frame classification strategy.
    pub type_detection: TypeDetection,
    /// Treatment of concurrent connections.
    pub connection_policy: ConnectionPolicy,
    /// Timeout applied by [`Peer::call`](crate::peer::Peer::call); `None`
    /// waits forever.
    pub call_timeout: Option<Duration>,
    /// Mirror log lines to the bound connection as `log` frames.
    pub forward_logs: bool,
    /// Least severe level mirrored when `forward_logs` is set.
    pub forward_level: Level,
    /// Bound of the outbound frame queue for each connection.
    pub outbound_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            type_detection: TypeDetection::default(),
            connection_policy: ConnectionPolicy::default(),
            call_timeout: None,
            forward_logs: false,
            forward_level: DEFAULT_FORWARD_LEVEL,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn with_type_detection(mut self, detection: TypeDetection) -> Self {
        self.type_detection = detection;
        self
    }

    #[must_use]
    pub fn with_connection_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.connection_policy = policy;
        self
    }

    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_forward_logs(mut self, enabled: bool) -> Self {
        self.forward_logs = enabled;
        self
    }

    #[must_use]
    pub fn with_forward_level(mut self, level: Level) -> Self {
        self.forward_level = level;
        self
    }

    /// Set the outbound queue bound. Zero is raised to one.
    #[must_use]
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }
}

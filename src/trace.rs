//! Per-frame trace context.
//!
//! A [`TraceContext`] carries the correlation identifier of one frame through
//! handler invocation and logging. Contexts are immutable: deriving one with
//! an extra value yields a new context and leaves the original untouched.

use std::{collections::BTreeMap, fmt, sync::Arc};

use uuid::Uuid;

/// Key under which [`TraceContext::get`] exposes the trace identifier.
pub const TRACE_ID_KEY: &str = "traceId";

/// Correlation identifier grouping every event caused by one logical request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(Arc<str>);

impl TraceId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string().into()) }

    /// Adopt the identifier carried by a frame, generating one when it is
    /// absent or empty.
    ///
    /// ```
    /// use wirebridge::trace::TraceId;
    ///
    /// assert_eq!(TraceId::from_wire(Some("t1")).as_str(), "t1");
    /// assert!(!TraceId::from_wire(Some("")).as_str().is_empty());
    /// ```
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(id) if !id.is_empty() => Self(id.into()),
            _ => Self::generate(),
        }
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self { Self(value.into()) }
}

impl From<String> for TraceId {
    fn from(value: String) -> Self { Self(value.into()) }
}

/// Immutable key-value carrier attached to the handling of one frame.
#[derive(Clone, Debug)]
pub struct TraceContext {
    trace_id: TraceId,
    values: Arc<BTreeMap<String, String>>,
}

impl TraceContext {
    /// Create a context for `trace_id` with no additional values.
    #[must_use]
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            values: Arc::default(),
        }
    }

    /// Create a context with a freshly generated trace identifier.
    #[must_use]
    pub fn generate() -> Self { Self::new(TraceId::generate()) }

    /// Identifier propagated into logs and outbound frames.
    #[must_use]
    pub fn trace_id(&self) -> &TraceId { &self.trace_id }

    /// Look up a value. [`TRACE_ID_KEY`] always resolves to the trace id.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == TRACE_ID_KEY {
            return Some(self.trace_id.as_str());
        }
        self.values.get(key).map(String::as_str)
    }

    /// Derive a new context carrying `key = value` in addition to the
    /// current values.
    ///
    /// Setting [`TRACE_ID_KEY`] replaces the trace identifier of the derived
    /// context.
    ///
    /// ```
    /// use wirebridge::trace::{TraceContext, TraceId};
    ///
    /// let base = TraceContext::new(TraceId::from("t1"));
    /// let derived = base.with_value("plugin", "calculator");
    /// assert_eq!(derived.get("plugin"), Some("calculator"));
    /// assert_eq!(base.get("plugin"), None);
    /// ```
    #[must_use]
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == TRACE_ID_KEY {
            return Self {
                trace_id: TraceId::from(value),
                values: Arc::clone(&self.values),
            };
        }
        let mut values = (*self.values).clone();
        values.insert(key, value);
        Self {
            trace_id: self.trace_id.clone(),
            values: Arc::new(values),
        }
    }

    /// Span tagging every event emitted while handling this frame.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("frame", trace_id = %self.trace_id)
    }
}

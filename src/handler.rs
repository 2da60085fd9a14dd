//! Request handlers and the method registry.
//!
//! A [`Handler`] serves one method name. Handlers receive the trace context
//! of the request and a [`Peer`] through which they may issue calls of their
//! own back to the host.

use std::{collections::HashMap, fmt, future::Future, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{peer::{CallError, Peer}, trace::TraceContext};

/// Everything a handler can see besides its parameters.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    /// Trace context of the request being served.
    pub trace: TraceContext,
    /// Handle for issuing outbound calls to the connected host.
    pub peer: Peer,
}

/// Failure reported by a handler. Its message becomes the `Error` field of
/// the response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str { &self.message }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self { Self::new(err) }
}

impl From<CallError> for HandlerError {
    fn from(err: CallError) -> Self { Self::new(err) }
}

impl From<MethodNotFoundError> for HandlerError {
    fn from(err: MethodNotFoundError) -> Self { Self::new(err) }
}

/// No handler is registered for the requested method.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("method not found: {method}")]
pub struct MethodNotFoundError {
    pub method: String,
}

/// Errors raised while building the method table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("method already registered: {0}")]
    DuplicateMethod(String),
    #[error("method name must not be empty")]
    EmptyMethod,
}

/// Asynchronous request handler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Serve one request.
    ///
    /// # Errors
    ///
    /// The returned [`HandlerError`] is reported to the caller as an error
    /// response.
    async fn call(&self, ctx: HandlerContext, params: Value) -> Result<Value, HandlerError>;
}

/// Handler built from an async closure over raw JSON. See [`handler_fn`].
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a [`Handler`].
///
/// ```
/// use serde_json::{Value, json};
/// use wirebridge::handler::{HandlerContext, HandlerError, handler_fn};
///
/// let ping = handler_fn(|_ctx: HandlerContext, _params: Value| async {
///     Ok::<_, HandlerError>(json!("pong"))
/// });
/// # drop(ping);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(HandlerContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(HandlerContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn call(&self, ctx: HandlerContext, params: Value) -> Result<Value, HandlerError> {
        (self.0)(ctx, params).await
    }
}

/// Handler that decodes its parameters into `P` and encodes its result from
/// `R`. See [`typed_handler_fn`].
pub struct TypedHandlerFn<F, P, R> {
    f: F,
    _types: PhantomData<fn(P) -> R>,
}

/// Wrap an async closure over typed parameters as a [`Handler`].
///
/// Parameters that fail to decode produce the error `invalid params: ...`
/// without running the closure.
///
/// ```
/// use serde::Deserialize;
/// use wirebridge::handler::{HandlerContext, HandlerError, typed_handler_fn};
///
/// #[derive(Deserialize)]
/// struct Add {
///     a: i64,
///     b: i64,
/// }
///
/// let add = typed_handler_fn(|_ctx: HandlerContext, p: Add| async move {
///     Ok::<_, HandlerError>(p.a + p.b)
/// });
/// # drop(add);
/// ```
pub fn typed_handler_fn<F, Fut, P, R>(f: F) -> TypedHandlerFn<F, P, R>
where
    F: Fn(HandlerContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    TypedHandlerFn {
        f,
        _types: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, P, R> Handler for TypedHandlerFn<F, P, R>
where
    F: Fn(HandlerContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    async fn call(&self, ctx: HandlerContext, params: Value) -> Result<Value, HandlerError> {
        let params: P = serde_json::from_value(params)
            .map_err(|err| HandlerError::new(format!("invalid params: {err}")))?;
        let result = (self.f)(ctx, params).await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Method name to handler table. Frozen once the bridge is built.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `handler` under `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the name is empty or already taken.
    pub fn register<H: Handler>(
        &mut self,
        method: impl Into<String>,
        handler: H,
    ) -> Result<(), RegistryError> {
        let method = method.into();
        if method.is_empty() {
            return Err(RegistryError::EmptyMethod);
        }
        if self.handlers.contains_key(&method) {
            return Err(RegistryError::DuplicateMethod(method));
        }
        self.handlers.insert(method, Arc::new(handler));
        Ok(())
    }

    /// Find the handler for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodNotFoundError`] when nothing is registered under it.
    pub fn lookup(&self, method: &str) -> Result<Arc<dyn Handler>, MethodNotFoundError> {
        self.handlers
            .get(method)
            .cloned()
            .ok_or_else(|| MethodNotFoundError {
                method: method.to_owned(),
            })
    }

    /// Registered method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize { self.handlers.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::{connection::ConnectionSlot, pending::PendingCalls, trace::TraceId};

    fn ctx() -> HandlerContext {
        HandlerContext {
            trace: TraceContext::new(TraceId::from("t1")),
            peer: Peer::new(PendingCalls::new(), ConnectionSlot::default(), None),
        }
    }

    #[derive(Deserialize)]
    struct Add {
        a: i64,
        b: i64,
    }

    #[test]
    fn duplicate_and_empty_names_are_rejected() {
        let mut registry = HandlerRegistry::new();
        registry
            .register("ping", MockHandler::new())
            .expect("first registration");
        assert_eq!(
            registry.register("ping", MockHandler::new()),
            Err(RegistryError::DuplicateMethod("ping".into()))
        );
        assert_eq!(
            registry.register("", MockHandler::new()),
            Err(RegistryError::EmptyMethod)
        );
    }

    #[test]
    fn lookup_reports_missing_method() {
        let registry = HandlerRegistry::new();
        let err = registry.lookup("foo").err().expect("missing");
        assert_eq!(err.to_string(), "method not found: foo");
    }

    #[tokio::test]
    async fn registered_handler_is_invoked() {
        let mut mock = MockHandler::new();
        mock.expect_call()
            .withf(|ctx, params| ctx.trace.trace_id().as_str() == "t1" && params == &json!({"x": 1}))
            .times(1)
            .returning(|_, _| Ok(json!("done")));
        let mut registry = HandlerRegistry::new();
        registry.register("work", mock).expect("register");
        let handler = registry.lookup("work").expect("lookup");
        let result = handler.call(ctx(), json!({"x": 1})).await;
        assert_eq!(result, Ok(json!("done")));
    }

    #[tokio::test]
    async fn typed_handler_decodes_params() {
        let add = typed_handler_fn(|_ctx, p: Add| async move { Ok(p.a + p.b) });
        let result = add.call(ctx(), json!({"a": 2, "b": 3})).await;
        assert_eq!(result, Ok(json!(5)));
    }

    #[tokio::test]
    async fn typed_handler_rejects_bad_params() {
        let add = typed_handler_fn(|_ctx, p: Add| async move { Ok(p.a + p.b) });
        let err = add
            .call(ctx(), json!({"a": "two"}))
            .await
            .expect_err("bad params");
        assert!(err.message().starts_with("invalid params: "), "{err}");
    }

    #[test]
    fn methods_are_sorted() {
        let mut registry = HandlerRegistry::new();
        for name in ["echo", "add", "ping"] {
            registry
                .register(name, handler_fn(|_, p| async move { Ok(p) }))
                .expect("register");
        }
        assert_eq!(registry.methods(), vec!["add", "echo", "ping"]);
    }
}

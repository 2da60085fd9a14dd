//! Runtime control for [`BridgeServer`].

mod accept;
mod backoff;

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{info, warn};

use super::{Bound, BridgeServer, ServerError};

impl BridgeServer<Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use wirebridge::{Bridge, server::BridgeServer};
    ///
    /// async fn try_run() {
    ///     BridgeServer::new(Bridge::builder().build())
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown the accept loop stops and every live connection is closed.
    ///
    /// ```
    /// use tokio::sync::oneshot;
    /// use wirebridge::{Bridge, server::BridgeServer};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), wirebridge::server::ServerError> {
    /// let server = BridgeServer::new(Bridge::builder().build()).bind(([127, 0, 0, 1], 0).into())?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join server task")
    ///     .expect("server run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let BridgeServer {
            bridge,
            ready_tx,
            backoff_config,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        if let Ok(addr) = listener.local_addr() {
            info!("bridge listening: addr={addr}");
        }
        tracker.spawn(accept_loop(
            listener,
            bridge,
            AcceptLoopOptions {
                shutdown: shutdown_token.clone(),
                tracker: tracker.clone(),
                backoff: backoff_config,
            },
        ));

        if let Some(tx) = ready_tx {
            if tx.send(()).is_err() {
                warn!("failed to send readiness signal: receiver dropped");
            }
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        info!("bridge stopped");
        Ok(())
    }
}

//! `wirebridge` binary: serve a bridge with a couple of built-in methods.

mod cli;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wirebridge::{
    Bridge,
    BridgeConfig,
    ConnectionPolicy,
    HandlerContext,
    HandlerError,
    TypeDetection,
    handler_fn,
    logging::TracingSink,
    server::BridgeServer,
};

fn config_from(cli: &cli::Cli) -> BridgeConfig {
    BridgeConfig::default()
        .with_connection_policy(if cli.reject_concurrent {
            ConnectionPolicy::Reject
        } else {
            ConnectionPolicy::Replace
        })
        .with_type_detection(if cli.lenient_type_detection {
            TypeDetection::Lenient
        } else {
            TypeDetection::Strict
        })
        .with_call_timeout(cli.call_timeout_ms.map(Duration::from_millis))
        .with_forward_logs(cli.forward_logs)
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: Option<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(addr) = addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!("metrics exporter listening: addr={addr}");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: Option<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
    if addr.is_some() {
        tracing::warn!("--metrics-addr ignored: built without the metrics feature");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    install_metrics(cli.metrics_addr)?;

    let bridge = Bridge::builder()
        .config(config_from(&cli))
        .log_sink(Arc::new(TracingSink))
        .method(
            "ping",
            handler_fn(|_: HandlerContext, _: Value| async { Ok::<_, HandlerError>(json!("pong")) }),
        )?
        .method(
            "echo",
            handler_fn(|_: HandlerContext, params: Value| async move { Ok::<_, HandlerError>(params) }),
        )?
        .build();

    let addr = SocketAddr::new(cli.host, cli.port);
    BridgeServer::new(bridge).bind(addr)?.run().await?;
    Ok(())
}

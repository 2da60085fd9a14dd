//! Command line interface for the `wirebridge` binary.

use std::net::IpAddr;

use clap::Parser;

/// Port the bridge listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 34987;

/// Command line arguments for the `wirebridge` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wirebridge",
    version,
    about = "Serve a bidirectional JSON-RPC bridge over WebSocket"
)]
pub struct Cli {
    /// TCP port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Refuse a second connection while one is active instead of replacing it.
    #[arg(long)]
    pub reject_concurrent: bool,

    /// Classify frames without a `Type` field by scanning for type tokens.
    #[arg(long)]
    pub lenient_type_detection: bool,

    /// Default timeout for outbound calls, in milliseconds.
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,

    /// Mirror log lines to the connected host as `log` frames.
    #[arg(long)]
    pub forward_logs: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, DEFAULT_PORT};

    #[test]
    fn defaults_apply() {
        let cli = Cli::parse_from(["wirebridge"]);
        assert_eq!(cli.port, DEFAULT_PORT);
        assert_eq!(cli.host.to_string(), "127.0.0.1");
        assert_eq!(cli.log_level, "info");
        assert!(!cli.reject_concurrent);
        assert_eq!(cli.call_timeout_ms, None);
    }

    #[test]
    fn parses_policy_flags() {
        let cli = Cli::parse_from([
            "wirebridge",
            "--port",
            "9000",
            "--reject-concurrent",
            "--lenient-type-detection",
            "--call-timeout-ms",
            "2500",
        ]);
        assert_eq!(cli.port, 9000);
        assert!(cli.reject_concurrent);
        assert!(cli.lenient_type_detection);
        assert_eq!(cli.call_timeout_ms, Some(2500));
    }
}

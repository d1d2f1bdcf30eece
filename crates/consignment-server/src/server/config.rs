use anyhow::bail;
use clap::{Parser, ValueEnum};
use consignment_core::types::DEFAULT_BATCH_SIZE;
use core::num::NonZeroUsize;
use core::time::Duration;

/// Output format of the console log layer.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Runtime configuration for the `consignment-server` binary.
///
/// Every value can be supplied as a CLI flag or an environment variable (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "consignment-server",
    version,
    about = "A gRPC order-management service with streaming shipment aggregation"
)]
pub struct CliArgs {
    /// Number of routed orders after which pending shipment groups are
    /// flushed on a `ProcessOrders` stream.
    ///
    /// Whatever is still pending when the client closes its side of the
    /// stream is flushed regardless of this value.
    ///
    /// Environment variable: `BATCH_SIZE`
    #[arg(long, env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE.get())]
    pub batch_size: usize,

    /// Capacity of the outbound buffer between a stream task and the gRPC
    /// response.
    ///
    /// A stream task suspends once this many messages are waiting for the
    /// client.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Seconds to wait for in-flight streams to finish during shutdown before
    /// they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Start with an empty order store instead of the fixture orders.
    ///
    /// Environment variable: `EMPTY_STORE`
    #[arg(long, env = "EMPTY_STORE", default_value_t = false)]
    pub empty_store: bool,

    /// Console log format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/consignment.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub batch_size: NonZeroUsize,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: Duration,
    pub seed_fixtures: bool,
    pub log_format: LogFormat,
    pub server_addr: String,
    pub uds: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            stream_buffer_size: 8,
            shutdown_timeout: Duration::from_secs(3),
            seed_fixtures: true,
            log_format: LogFormat::Pretty,
            server_addr: String::from("0.0.0.0:50051"),
            uds: false,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let Some(batch_size) = NonZeroUsize::new(args.batch_size) else {
            bail!("BATCH_SIZE must be greater than 0");
        };

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            batch_size,
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            seed_fixtures: !args.empty_store,
            log_format: args.log_format,
            server_addr: args.server_addr,
            uds: args.uds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(core::iter::once("consignment-server").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_validate() {
        let config = ServerConfig::try_from(parse(&[])).unwrap();
        assert_eq!(config.batch_size.get(), 3);
        assert_eq!(config.stream_buffer_size, 8);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert!(config.seed_fixtures);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.uds);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = ServerConfig::try_from(parse(&["--batch-size", "0"])).unwrap_err();
        assert!(err.to_string().contains("BATCH_SIZE"));
    }

    #[test]
    fn zero_stream_buffer_is_rejected() {
        let err = ServerConfig::try_from(parse(&["--stream-buffer-size", "0"])).unwrap_err();
        assert!(err.to_string().contains("STREAM_BUFFER_SIZE"));
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_from(parse(&[
            "--batch-size",
            "5",
            "--empty-store",
            "--log-format",
            "json",
        ]))
        .unwrap();
        assert_eq!(config.batch_size.get(), 5);
        assert!(!config.seed_fixtures);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}

use clap::Parser;
use timestamp_tonic_core::Error;

/// Default listening address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Runtime configuration for the `timestamp-tonic-server` binary.
///
/// Values come from CLI arguments, then environment variables (a `.env` file
/// is loaded first), then the defaults below.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "timestamp-tonic-server",
    version,
    about = "A gRPC service for single-shot and streaming wall-clock timestamps"
)]
pub struct CliArgs {
    /// Address to listen on (TCP, or a Unix socket path with --uds).
    ///
    /// May also be given as `--server-addr` or through `SERVER_ADDR`. The
    /// positional form wins when both are present.
    #[arg(value_name = "ADDR")]
    pub addr: Option<String>,

    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/timestamp.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from(DEFAULT_SERVER_ADDR))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, the address must be a
    /// file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Number of timestamps buffered per stream before the emitter waits on
    /// the client.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub stream_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_owned(),
            uds: false,
            stream_buffer_size: 8,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        // tokio's bounded channel panics on a zero capacity
        if args.stream_buffer_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "STREAM_BUFFER_SIZE must be greater than 0".to_string(),
            });
        }

        let server_addr = args.addr.unwrap_or(args.server_addr);
        if server_addr.trim().is_empty() {
            return Err(Error::InvalidConfig {
                reason: "server address must not be empty".to_string(),
            });
        }

        Ok(Self {
            server_addr,
            uds: args.uds,
            stream_buffer_size: args.stream_buffer_size,
        })
    }
}

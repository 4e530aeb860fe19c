use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::lookup_host;

use super::probe_config::{ConfigError, ProbeConfig, parse_duration};

/// Command line surface. Flags also read `OXYPING_*` environment variables
/// (a `.env` file is loaded first) and fall back to the YAML config file.
#[derive(Parser, Debug)]
#[command(
    name = "oxyping",
    version,
    about = "Repeatedly query a DNS server and report response time percentiles",
    after_help = "eg:\toxyping www.google.com. 127.0.0.1"
)]
pub struct Args {
    /// Port to connect to [default: 53]
    #[arg(short, long, env = "OXYPING_PORT")]
    pub port: Option<u16>,

    /// How long to wait between requests, e.g. 250ms, 2s or 1m30s [default: 1s]
    #[arg(short, long, env = "OXYPING_INTERVAL", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// How many requests to make. Default is to run until ^C
    #[arg(short, long, env = "OXYPING_COUNT", allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Query type to use (A, SOA, CNAME...) [default: A]
    #[arg(short = 't', long = "type", env = "OXYPING_TYPE")]
    pub query_type: Option<String>,

    /// Give up on a single request after this long [default: 2s]
    #[arg(long, env = "OXYPING_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// YAML file with probe defaults
    #[arg(long, env = "OXYPING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log every response in full
    #[arg(short, long)]
    pub verbose: bool,

    /// Name to query, e.g. www.google.com.
    pub query: String,

    /// DNS server host name or address
    pub server: String,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub query_name: String,
    pub server_host: String,
    pub port: u16,
    pub interval: Duration,
    /// Zero means unbounded.
    pub count: u64,
    pub query_type: String,
    pub timeout: Duration,
    pub histogram_offset: f64,
    pub histogram_resolution: f64,
    pub percentiles: Vec<f64>,
    pub verbose: bool,
}

impl AppConfig {
    /// Read the optional YAML file named by `--config` and layer the flags over it.
    pub fn load(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => {
                log::debug!("Reading probe defaults from {:?}", path);
                ProbeConfig::from_file(path)?
            }
            None => ProbeConfig::default(),
        };
        Ok(Self::merge(args, file))
    }

    pub fn merge(args: Args, file: ProbeConfig) -> Self {
        let count = args.count.unwrap_or(file.count);
        Self {
            query_name: args.query,
            server_host: args.server,
            port: args.port.unwrap_or(file.port),
            interval: args.interval.unwrap_or(file.interval),
            count: u64::try_from(count).unwrap_or(0),
            query_type: args.query_type.unwrap_or(file.query_type),
            timeout: args.timeout.unwrap_or(file.timeout),
            histogram_offset: file.histogram_offset,
            histogram_resolution: file.histogram_resolution,
            percentiles: file.percentiles,
            verbose: args.verbose,
        }
    }

    /// `host:port` as shown to the user.
    pub fn server_label(&self) -> String {
        match self.server_host.contains(':') {
            true => format!("[{}]:{}", self.server_host, self.port),
            false => format!("{}:{}", self.server_host, self.port),
        }
    }
}

/// Resolve the server once, before probing starts; the first address wins.
pub async fn resolve_server(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let resolve_error = |reason: String| ConfigError::Resolve {
        host: host.to_string(),
        port,
        reason,
    };
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|e| resolve_error(e.to_string()))?;
    addrs
        .next()
        .ok_or_else(|| resolve_error("no addresses found".to_string()))
}

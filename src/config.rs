use std::time::Duration;

/// Ingests the public EDDN ZeroMQ feed, evaluates it against per-subscriber
/// predicate trees, and fans matching events out over WebSocket, with an
/// optional MongoDB-backed retention window for historical queries.
#[derive(clap::Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Endpoint of the upstream EDDN ZeroMQ feed.
    #[arg(long, env = "UPSTREAM_URL", default_value = "tcp://eddn.edcd.io:9500")]
    pub upstream_url: String,

    /// How long to wait for an upstream message before retrying the recv, in milliseconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value = "600000")]
    pub upstream_timeout_ms: u64,

    /// Host to bind the WebSocket/HTTP transport surface to.
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub relay_host: String,

    /// Port to bind the WebSocket/HTTP transport surface to.
    #[arg(long, env = "RELAY_PORT", default_value = "9600")]
    pub relay_port: u16,

    /// Application log level.
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: LogLevel,

    /// Enable the MongoDB-backed retention store and the historical query endpoint.
    #[arg(long, env = "USE_STORE", default_value = "false")]
    pub use_store: bool,

    /// MongoDB connection URI for the retention store.
    #[arg(long, env = "STORE_URI", default_value = "mongodb://localhost:27017")]
    pub store_uri: String,

    /// MongoDB database name for the retention store.
    #[arg(long, env = "STORE_DATABASE", default_value = "eddn_relay")]
    pub store_database: String,

    /// Retention window, in hours.
    #[arg(long, env = "CACHE_TTL", default_value = "24")]
    pub cache_ttl: u64,
}

impl Cli {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl * 3600)
    }
}

/// Mirrors the five levels accepted by `LOG_LEVEL` in the original relay's
/// `logging_config.py`, in increasing order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_level_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            // tracing has no CRITICAL level; ERROR is the closest and highest it defines.
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

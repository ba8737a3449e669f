use crate::config::LogLevel;

/// Installs the global `tracing` subscriber.
///
/// `log_level` sets the default verbosity (mirroring `LOG_LEVEL` from the
/// original relay's `logging_config.py`); `RUST_LOG`, if set, layers on top
/// and can override it per-module, same as `oidc-discovery-server`'s
/// `EnvFilter::from_default_env()`.
pub fn install(log_level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.as_level_filter().into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!matches!(std::env::var("NO_COLOR"), Ok(v) if v == "1"))
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");
}

//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{Context, Result};
use beacon_core::config::{Config, TransportConfig};
use beacon_core::manager::BuildInfo;
use beacon_core::monitoring::TelemetryMetrics;
use beacon_core::transport::{BufferedTransport, JsonLinesSink, LogSink};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Common CLI arguments for all binaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// TOML configuration file (environment variables still override it)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address the demo HTTP server binds to
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Log level, overrides the configured one
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Load configuration and apply CLI overrides
pub fn load_config(args: &CommonArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::from_env()?,
    };

    if let Some(level) = &args.log_level {
        config.logging.log_level = level.clone();
    }
    if args.json_logs {
        config.logging.json_logs = true;
    }

    config.validate()?;
    Ok(config)
}

/// Buffered transport writing to the journal when one is configured,
/// otherwise to the log
pub fn build_transport(
    config: &TransportConfig,
    metrics: Arc<TelemetryMetrics>,
) -> Result<BufferedTransport> {
    let transport = match &config.journal_path {
        Some(path) => BufferedTransport::new(JsonLinesSink::open(path)?, config)?,
        None => BufferedTransport::new(LogSink::new(), config)?,
    };

    Ok(transport.with_metrics(metrics))
}

/// Version and build identity of this binary
///
/// `BEACON_BUILD_HASH` and `BEACON_BUILD_TIME` are read at compile time.
pub fn build_info() -> BuildInfo {
    BuildInfo::new(
        env!("CARGO_PKG_VERSION"),
        option_env!("BEACON_BUILD_HASH").unwrap_or("unknown"),
        option_env!("BEACON_BUILD_TIME").unwrap_or("unknown"),
    )
}

/// Print final transport statistics
pub fn print_stats(transport: &BufferedTransport) {
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Events enqueued: {}", transport.enqueued());
    tracing::info!("Events dropped: {}", transport.dropped());
    tracing::info!("Events delivered: {}", transport.delivered());
    tracing::info!("Events failed: {}", transport.failed());
}
